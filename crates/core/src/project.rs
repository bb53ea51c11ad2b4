//! On-disk project model.
//!
//! A project is a folder holding a `.csproj`, a `src/` tree with the user's
//! game code and a `Universe/` asset tree whose `Info.json` names the product.
//!
//! ```text
//! <root>/
//!   <name>.csproj
//!   src/            user scripts
//!   lib/Debug/      package libraries (debug)
//!   lib/Release/    package libraries (release)
//!   Universe/       asset universe, Info.json
//!   Build/          compiled game library (output)
//!   Temp/           scratch space for the compiler
//!   Icon.ico
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::fs;
use crate::result::{Result, ResultExt};

/// Kind of project; only game projects are previewed in a rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    #[default]
    Game,
    Artwork,
}

/// Semantic version triple of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Light map tuning saved with the universe. Fractions are `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightMapInfo {
    pub pixel_style: bool,
    pub self_lerp: f32,
    pub air_illuminance_day: f32,
    pub air_illuminance_night: f32,
    pub background_tint: f32,
    pub solid_illuminance: f32,
    pub level_illuminate_remain: f32,
}

impl Default for LightMapInfo {
    fn default() -> Self {
        Self {
            pixel_style: false,
            self_lerp: 0.88,
            air_illuminance_day: 0.95,
            air_illuminance_night: 0.3,
            background_tint: 0.5,
            solid_illuminance: 1.0,
            level_illuminate_remain: 0.3,
        }
    }
}

/// Product metadata stored in `Universe/Info.json`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UniverseInfo {
    pub product_name: String,
    pub developer_name: String,
    #[serde(default)]
    pub major_version: u32,
    #[serde(default)]
    pub minor_version: u32,
    #[serde(default)]
    pub patch_version: u32,
    #[serde(default)]
    pub project_type: ProjectType,
    #[serde(default)]
    pub light_map: LightMapInfo,
}

impl UniverseInfo {
    #[must_use]
    pub const fn version(&self) -> Version {
        Version {
            major: self.major_version,
            minor: self.minor_version,
            patch: self.patch_version,
        }
    }
}

/// A user project and every path derived from its root.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    root: PathBuf,
    info: UniverseInfo,
}

impl Project {
    /// Name of the metadata file inside the universe folder.
    pub const INFO_FILE: &'static str = "Info.json";

    /// Open the project rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if `Universe/Info.json` cannot be read or parsed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let info_path = root.join("Universe").join(Self::INFO_FILE);
        let content = std::fs::read_to_string(&info_path)
            .map_err(|e| Error::file_read_failed(&info_path, e.to_string()))?;
        let info: UniverseInfo = serde_json::from_str(&content)
            .map_err(|e| Error::json_parse_failed(&info_path, e.to_string()))?;
        Ok(Self::with_info(root, info))
    }

    /// Build a project from already-known metadata.
    #[must_use]
    pub fn with_info(root: impl Into<PathBuf>, info: UniverseInfo) -> Self {
        Self {
            root: root.into(),
            info,
        }
    }

    #[must_use]
    pub fn info(&self) -> &UniverseInfo {
        &self.info
    }

    #[must_use]
    pub fn project_dir(&self) -> &Path {
        &self.root
    }

    /// The project's `.csproj`, looked up on every call so one added after
    /// opening is found. Falls back to `<root>/<folder name>.csproj`.
    #[must_use]
    pub fn csproj_path(&self) -> PathBuf {
        locate_csproj(&self.root)
    }

    #[must_use]
    pub fn source_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    #[must_use]
    pub fn build_dir(&self) -> PathBuf {
        self.root.join("Build")
    }

    #[must_use]
    pub fn temp_root(&self) -> PathBuf {
        self.root.join("Temp")
    }

    #[must_use]
    pub fn temp_build_dir(&self) -> PathBuf {
        self.temp_root().join("Build")
    }

    #[must_use]
    pub fn temp_publish_dir(&self) -> PathBuf {
        self.temp_root().join("Publish")
    }

    #[must_use]
    pub fn universe_dir(&self) -> PathBuf {
        self.root.join("Universe")
    }

    #[must_use]
    pub fn info_path(&self) -> PathBuf {
        self.universe_dir().join(Self::INFO_FILE)
    }

    #[must_use]
    pub fn icon_path(&self) -> PathBuf {
        self.root.join("Icon.ico")
    }

    /// Folder holding package libraries for the given configuration.
    #[must_use]
    pub fn library_dir(&self, debug: bool) -> PathBuf {
        self.root
            .join("lib")
            .join(if debug { "Debug" } else { "Release" })
    }

    /// Assembly name of the compiled game library.
    #[must_use]
    pub fn library_name(&self) -> String {
        library_name(&self.info.product_name)
    }

    /// Newest modification stamp over the project's scripts, 0 if none.
    #[must_use]
    pub fn script_modify_stamp(&self) -> i64 {
        fs::newest_modify_stamp(&self.source_dir(), "*.cs", false)
            .or_default_logged("read script stamps", 0)
    }

    /// Newest modification stamp over the built libraries, 0 if none.
    #[must_use]
    pub fn build_library_modify_stamp(&self) -> i64 {
        fs::newest_modify_stamp(&self.build_dir(), "*.dll", true)
            .or_default_logged("read build library stamps", 0)
    }

    pub fn set_light_map(&mut self, light_map: LightMapInfo) {
        self.info.light_map = light_map;
    }

    /// Persist the metadata back to `Universe/Info.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_info(&self) -> Result<()> {
        let path = self.info_path();
        let json = serde_json::to_string_pretty(&self.info)
            .map_err(|e| Error::file_write_failed(&path, e.to_string()))?;
        std::fs::write(&path, json).map_err(|e| Error::file_write_failed(&path, e.to_string()))
    }
}

/// Assembly name (without extension) of a product's game library.
#[must_use]
pub fn library_name(product_name: &str) -> String {
    format!("lib.{product_name}")
}

fn locate_csproj(root: &Path) -> PathBuf {
    fs::find_files(root, "*.csproj", false)
        .ok_logged("look for a csproj")
        .and_then(|mut found| {
            found.sort();
            found.into_iter().next()
        })
        .unwrap_or_else(|| {
            let stem = fs::file_name_of(root);
            root.join(format!("{stem}.csproj"))
        })
}
