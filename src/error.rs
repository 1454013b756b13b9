pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The hasher was constructed with `portable = false`; only the portable
    /// `$P$` scheme is supported.
    #[error("Non-portable hashing is not supported")]
    NotPortable,

    /// The produced hash did not come out at the expected 34 characters.
    /// This signals an implementation defect, not a runtime condition.
    #[error("Produced hash has length {0}, expected 34")]
    BadHashLength(usize),
}
