use crate::resolver::Resolution;
use crate::utils::create_parent_dir;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Default)]
pub struct StatsAccumulator<T: ToString> {
    points: Vec<(u64, T)>,
}

impl<T: ToString> StatsAccumulator<T> {
    pub fn add_stats(&mut self, epoch: u64, data: T) {
        self.points.push((epoch, data));
    }

    pub fn dump_stats(&self, path: &Path, format: &str) -> anyhow::Result<()> {
        create_parent_dir(path)?;
        let mut stats = File::create(path)?;
        stats.write_all(format!("epoch,{}\n", format).as_bytes())?;
        for (epoch, data) in self.points.iter() {
            stats.write_all(format!("{},{}\n", epoch, data.to_string()).as_bytes())?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolutionStats {
    pub accepted: usize,
    pub rejected: usize,
    pub fees: i128,
    pub passes: usize,
}

impl ResolutionStats {
    pub const FORMAT: &'static str = "accepted,rejected,fees,passes";
}

impl From<&Resolution> for ResolutionStats {
    fn from(resolution: &Resolution) -> Self {
        Self {
            accepted: resolution.accepted.len(),
            rejected: resolution.rejected.len(),
            fees: resolution.total_fees.as_i128(),
            passes: resolution.passes,
        }
    }
}

impl fmt::Display for ResolutionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.accepted, self.rejected, self.fees, self.passes)
    }
}
