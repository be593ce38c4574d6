pub mod bundle;
pub mod loader;

#[cfg(test)]
pub(crate) mod test_support;

pub use bundle::{AssetBundle, AssetNode};
pub use loader::{AssetLoader, LoadError, LoadHandle, LoadProgress, LoadResult};
