use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::registry::FarmRegistry;
use crate::registry::table::TextTable;

impl FarmRegistry {
    /// Attaches the SEPA site identification numbers from a `farm,GSID`
    /// table. Returns how many farms received one.
    pub fn attach_gsid<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let table = TextTable::read(path.as_ref(), b',')?;
        let mut attached = 0;

        for row in 1..table.height() {
            let (Some(key), Some(gsid)) = (table.cell(row, 0), table.cell(row, 1)) else {
                continue;
            };
            match self.index_of(key) {
                Some(id) => {
                    self.farms_mut()[id].gsid = Some(gsid.to_string());
                    attached += 1;
                }
                None => debug!(farm = key, "not found in farm data"),
            }
        }

        Ok(attached)
    }
}
