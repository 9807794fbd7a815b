/// Result alias used across the crate.
pub type ReelResult<T> = Result<T, ReelError>;

/// Terminal failure of a render stage.
///
/// Each variant maps onto one [`ErrorKind`]; callers that only need to branch on the failure class
/// should use [`ReelError::kind`].
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// No usable video input (absent, unreadable, zero length or unsupported container).
    #[error("missing asset: {0}")]
    MissingAsset(String),

    /// Target duration is non-positive or non-finite.
    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    /// Poem reduces to zero displayable lines.
    #[error("empty text: {0}")]
    EmptyText(String),

    /// Upstream asset resolution failed; passed through unchanged.
    #[error("asset unavailable: {0}")]
    AssetUnavailable(String),

    /// Style parameters other than duration are unusable.
    #[error("invalid style: {0}")]
    InvalidStyle(String),

    /// Decode, encode, font or filesystem failure while compositing.
    #[error("render error: {0}")]
    Render(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Stable classification of [`ReelError`] values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`ReelError::MissingAsset`].
    MissingAsset,
    /// See [`ReelError::InvalidDuration`].
    InvalidDuration,
    /// See [`ReelError::EmptyText`].
    EmptyText,
    /// See [`ReelError::AssetUnavailable`].
    AssetUnavailable,
    /// See [`ReelError::InvalidStyle`].
    InvalidStyle,
    /// See [`ReelError::Render`].
    Render,
}

impl ReelError {
    pub fn missing_asset(msg: impl Into<String>) -> Self {
        Self::MissingAsset(msg.into())
    }

    pub fn invalid_duration(msg: impl Into<String>) -> Self {
        Self::InvalidDuration(msg.into())
    }

    pub fn empty_text(msg: impl Into<String>) -> Self {
        Self::EmptyText(msg.into())
    }

    pub fn asset_unavailable(msg: impl Into<String>) -> Self {
        Self::AssetUnavailable(msg.into())
    }

    pub fn invalid_style(msg: impl Into<String>) -> Self {
        Self::InvalidStyle(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Failure class of this error. Untyped `anyhow` errors only arise from IO while rendering.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingAsset(_) => ErrorKind::MissingAsset,
            Self::InvalidDuration(_) => ErrorKind::InvalidDuration,
            Self::EmptyText(_) => ErrorKind::EmptyText,
            Self::AssetUnavailable(_) => ErrorKind::AssetUnavailable,
            Self::InvalidStyle(_) => ErrorKind::InvalidStyle,
            Self::Render(_) | Self::Other(_) => ErrorKind::Render,
        }
    }
}
