//! Asset Token Definitions
//!
//! An asset token is the pair (base, remainder). The base is the part that gets
//! swapped when assets move (a directory on disk, or the archive prefix); the
//! remainder is kept verbatim, so files expanded from one playlist directory
//! keep their relative layout wherever they end up.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

/// Normalized location of an asset, split into a relocatable base and a fixed remainder
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetToken {
    /// Directory on disk, or archive prefix
    pub base: String,
    /// Path relative to `base`, always `/`-separated
    pub remainder: String,
}

impl AssetToken {
    /// Creates a token from its two parts
    pub fn new(base: impl Into<String>, remainder: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            remainder: remainder.into(),
        }
    }

    /// Token for a path that is not in a recognized asset location
    pub fn unlocated(path: impl Into<String>) -> Self {
        Self::new(path, "")
    }

    /// Returns true if the token carries a remainder that can be rebased
    pub fn is_located(&self) -> bool {
        !self.remainder.is_empty()
    }

    /// Reconstructs the full path (`base/remainder`)
    pub fn joined(&self) -> String {
        if self.remainder.is_empty() {
            self.base.clone()
        } else if self.base.is_empty() {
            self.remainder.clone()
        } else {
            format!("{}/{}", self.base.trim_end_matches(['/', '\\']), self.remainder)
        }
    }

    /// Returns the path this asset has once moved below `base`
    pub fn rebased(&self, base: &str) -> String {
        let trimmed = base.trim_end_matches(['/', '\\']);
        if trimmed.is_empty() && base.starts_with('/') {
            format!("/{}", self.remainder)
        } else {
            format!("{}/{}", trimmed, self.remainder)
        }
    }
}

impl fmt::Display for AssetToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl Ord for AssetToken {
    fn cmp(&self, other: &Self) -> Ordering {
        self.joined()
            .cmp(&other.joined())
            .then_with(|| self.base.cmp(&other.base))
            .then_with(|| self.remainder.cmp(&other.remainder))
    }
}

impl PartialOrd for AssetToken {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joined() {
        let t = AssetToken::new("/home/foo", "image.jpg");
        assert_eq!(t.joined(), "/home/foo/image.jpg");

        let t = AssetToken::new("/home/foo/", "subdir/image.jpg");
        assert_eq!(t.joined(), "/home/foo/subdir/image.jpg");

        let t = AssetToken::new("", "image.jpg");
        assert_eq!(t.joined(), "image.jpg");

        let t = AssetToken::unlocated("/somewhere/else.jpg");
        assert_eq!(t.joined(), "/somewhere/else.jpg");
        assert!(!t.is_located());
    }

    #[test]
    fn test_rebased_keeps_remainder() {
        let t = AssetToken::new("/Users/dev/Downloads", "OBS-TransportTest/Rotating_earth.mp4");
        assert_eq!(t.rebased("assets"), "assets/OBS-TransportTest/Rotating_earth.mp4");
        assert_eq!(
            t.rebased("/home/dev/Documents/OBS/Scene-Assets/TransportTest/"),
            "/home/dev/Documents/OBS/Scene-Assets/TransportTest/OBS-TransportTest/Rotating_earth.mp4"
        );
        assert_eq!(t.rebased("/"), "/OBS-TransportTest/Rotating_earth.mp4");
    }

    #[test]
    fn test_marker_like_text_is_not_special() {
        // A directory literally containing "/./" must not confuse the split
        let t = AssetToken::new("/odd/./dir", "file.png");
        assert_eq!(t.remainder, "file.png");
        assert_eq!(t.rebased("assets"), "assets/file.png");
    }

    #[test]
    fn test_ordering_follows_full_path() {
        let mut tokens = vec![
            AssetToken::new("/b", "z.jpg"),
            AssetToken::new("/a", "y.jpg"),
            AssetToken::new("/a-b", "x.jpg"),
        ];
        tokens.sort();
        let joined: Vec<String> = tokens.iter().map(AssetToken::joined).collect();
        assert_eq!(joined, vec!["/a-b/x.jpg", "/a/y.jpg", "/b/z.jpg"]);
    }

    #[test]
    fn test_serialization() {
        let t = AssetToken::new("assets", "dir/a.png");
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#"{"base":"assets","remainder":"dir/a.png"}"#);
    }
}
