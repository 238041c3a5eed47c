use std::fmt;
use std::str::FromStr;

/// A desktop platform with its own icon packaging requirements.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Platform {
    /// Windows, which ships icons as a single ICO container.
    Windows,
    /// macOS, which ships icons as a single ICNS container.
    MacOs,
    /// Linux, which ships icons as standalone PNG files per size.
    Linux,
}

impl Platform {
    /// Returns the static profile describing this platform's icon
    /// requirements.
    pub fn profile(self) -> &'static PlatformProfile {
        match self {
            Platform::Windows => &WINDOWS_PROFILE,
            Platform::MacOs => &MACOS_PROFILE,
            Platform::Linux => &LINUX_PROFILE,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, out: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let name = match self {
            Platform::Windows => "windows",
            Platform::MacOs => "macos",
            Platform::Linux => "linux",
        };
        write!(out, "{}", name)
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(input: &str) -> Result<Platform, String> {
        match input {
            "windows" => Ok(Platform::Windows),
            "macos" => Ok(Platform::MacOs),
            "linux" => Ok(Platform::Linux),
            _ => Err(format!("unknown platform: {}", input)),
        }
    }
}

/// The container format a platform's icons are delivered in.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ContainerFormat {
    /// Microsoft icon directory, all sizes in one `.ico` file.
    Ico,
    /// Apple icon suite, all sizes in one `.icns` file.
    Icns,
    /// No container; one `.png` file per size.
    PngSet,
}

impl ContainerFormat {
    /// Returns the short format tag used to label generated files.
    pub fn tag(self) -> &'static str {
        match self {
            ContainerFormat::Ico => "ico",
            ContainerFormat::Icns => "icns",
            ContainerFormat::PngSet => "png",
        }
    }

    /// Returns the MIME type of files in this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            ContainerFormat::Ico => "image/x-icon",
            ContainerFormat::Icns => "image/icns",
            ContainerFormat::PngSet => "image/png",
        }
    }
}

/// Static description of which sizes and container format a platform's
/// icons require. Profiles are defined once and never mutated; adding a
/// platform means adding a profile and, at most, one encoder.
pub struct PlatformProfile {
    /// The platform this profile describes.
    pub platform: Platform,
    /// Every edge length the platform expects, ascending.
    pub required_sizes: &'static [u32],
    /// How the rasterized bitmaps are packaged.
    pub format: ContainerFormat,
}

static WINDOWS_PROFILE: PlatformProfile = PlatformProfile {
    platform: Platform::Windows,
    required_sizes: &[16, 24, 32, 48, 64, 128, 256],
    format: ContainerFormat::Ico,
};

static MACOS_PROFILE: PlatformProfile = PlatformProfile {
    platform: Platform::MacOs,
    required_sizes: &[16, 32, 64, 128, 256, 512, 1024],
    format: ContainerFormat::Icns,
};

static LINUX_PROFILE: PlatformProfile = PlatformProfile {
    platform: Platform::Linux,
    required_sizes: &[16, 32, 48, 64, 96, 128, 256, 512],
    format: ContainerFormat::PngSet,
};
