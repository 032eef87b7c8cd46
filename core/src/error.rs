/// an inconsistency that should never happen, with where it was detected
///
/// use [`critical_error!`](crate::critical_error) to build one.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CriticalError {
    pub file: &'static str,
    pub line: u32,
    pub reason: &'static str,
}

impl std::fmt::Display for CriticalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "critical level error in {}:{}: {}",
            self.file, self.line, self.reason
        )
    }
}

impl std::error::Error for CriticalError {}

#[macro_export]
macro_rules! critical_error {
    ($reason:literal) => {
        $crate::error::CriticalError {
            line: line!(),
            file: file!(),
            reason: $reason,
        }
    };
}
