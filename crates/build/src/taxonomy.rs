//! Stable build and publish failure codes.
//!
//! Codes are negative and never reused; success is reported as `0` by
//! [`ErrorCode::code_of`].

use thiserror::Error;

/// Every failure class a build, publish or run request can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[repr(i32)]
pub enum ErrorCode {
    #[error("Build Error: Project object is null")]
    ProjectObjectNull = -100,

    #[error("Build Error: Project folder path invalid")]
    ProjectFolderInvalid = -101,

    #[error("Build Error: Publish folder path invalid")]
    PublishDirInvalid = -102,

    #[error("Build Error: Project folder not exists")]
    ProjectFolderMissing = -103,

    #[error("Build Error: Product name invalid")]
    ProductNameInvalid = -104,

    #[error("Build Error: Developer name invalid")]
    DeveloperNameInvalid = -105,

    #[error("Build Error: Result library file not found")]
    ResultLibraryMissing = -106,

    #[error("Build Error: Runtime file not found in the engine folder")]
    RuntimeFileMissing = -107,

    #[error("Build Error: Universe folder not found")]
    AssetUniverseMissing = -108,

    #[error("Build Error: No executable to run")]
    NoExecutableToRun = -109,

    #[error("Build Error: Compiler toolchain not found in the engine folder")]
    CompilerToolchainMissing = -110,

    #[error("Build Error: Entry project for publishing not found")]
    EntryProjectMissing = -111,

    #[error("Build Error: Entry executable result not found")]
    EntryResultMissing = -112,

    #[error("Build Error: User code failed to compile")]
    UserCodeCompileError = -113,

    #[error("Build Error: Csproj file not found")]
    CsprojMissing = -114,

    #[error("Unknown error while building project")]
    Unknown = -199,
}

impl ErrorCode {
    /// All codes, ordered by value from -100 down.
    pub const ALL: [Self; 16] = [
        Self::ProjectObjectNull,
        Self::ProjectFolderInvalid,
        Self::PublishDirInvalid,
        Self::ProjectFolderMissing,
        Self::ProductNameInvalid,
        Self::DeveloperNameInvalid,
        Self::ResultLibraryMissing,
        Self::RuntimeFileMissing,
        Self::AssetUniverseMissing,
        Self::NoExecutableToRun,
        Self::CompilerToolchainMissing,
        Self::EntryProjectMissing,
        Self::EntryResultMissing,
        Self::UserCodeCompileError,
        Self::CsprojMissing,
        Self::Unknown,
    ];

    /// Integer value of the code.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Look a code up by value. `0` and unknown values yield `None`.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.code() == code)
    }

    /// Integer value of a whole build result: `0` on success.
    #[must_use]
    pub const fn code_of<T>(result: &Result<T, Self>) -> i32 {
        match result {
            Ok(_) => 0,
            Err(code) => code.code(),
        }
    }

    /// Whether the failure is reported as a list of compiler lines rather
    /// than a single message.
    #[must_use]
    pub const fn has_compiler_log(self) -> bool {
        matches!(self, Self::UserCodeCompileError)
    }
}
