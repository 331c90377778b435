use thiserror::Error;

/// Errors that stop `apply_patch` from touching the file at all (spec §4.G
/// "Safety"). A missed search block is *not* one of these — it is reported
/// as a warning on [`crate::PatchReport`] instead, because other blocks in
/// the same diff must still be applied.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("File must be within current working directory")]
    PathOutsideCwd,

    #[error("Cannot apply edits to the current working directory itself")]
    PathIsCwd,

    #[error("No valid edit blocks found in diff text")]
    NoValidBlocks,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
