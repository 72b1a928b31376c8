//! Report port for scan results.

use crate::domain::error::GapscoutError;
use crate::domain::scanner::ScanResult;

/// Port for writing scan results.
pub trait ReportPort {
    fn write(&self, result: &ScanResult, output_path: &str) -> Result<(), GapscoutError>;
}
