//! Core bottle domain types.
//!
//! A bottle is an isolated Windows-compatibility environment backed by a
//! Wine prefix directory. The types here are plain values: they are
//! assembled on the GUI thread (from forms or config files) and handed
//! unchanged into background tasks, so none of them carry interior
//! mutability.

use camino::Utf8PathBuf;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Default wine debug log level (`WINEDEBUG` verbosity tier) used when a
/// form value cannot be parsed.
pub const DEFAULT_DEBUG_LOG_LEVEL: u8 = 1;

/// Highest supported debug log level.
pub const MAX_DEBUG_LOG_LEVEL: u8 = 8;

/// Resolution applied when virtual desktop mode is enabled but the entered
/// resolution is not valid.
pub const DEFAULT_VIRTUAL_DESKTOP_RESOLUTION: &str = "1024x768";

static RESOLUTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2,5}x[0-9]{2,5}$").expect("resolution pattern"));

/// Check whether a virtual desktop resolution string looks like `WIDTHxHEIGHT`.
pub fn is_valid_resolution(resolution: &str) -> bool {
    RESOLUTION_RE.is_match(resolution)
}

/// Windows version emulated inside a bottle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowsVersion {
    WindowsXp,
    WindowsVista,
    Windows7,
    Windows8,
    Windows81,
    #[default]
    Windows10,
    Windows11,
}

impl WindowsVersion {
    /// All supported versions, in combobox order.
    pub const ALL: [WindowsVersion; 7] = [
        WindowsVersion::WindowsXp,
        WindowsVersion::WindowsVista,
        WindowsVersion::Windows7,
        WindowsVersion::Windows8,
        WindowsVersion::Windows81,
        WindowsVersion::Windows10,
        WindowsVersion::Windows11,
    ];

    /// The `winecfg -v` key for this version.
    pub fn winecfg_key(self) -> &'static str {
        match self {
            WindowsVersion::WindowsXp => "winxp",
            WindowsVersion::WindowsVista => "vista",
            WindowsVersion::Windows7 => "win7",
            WindowsVersion::Windows8 => "win8",
            WindowsVersion::Windows81 => "win81",
            WindowsVersion::Windows10 => "win10",
            WindowsVersion::Windows11 => "win11",
        }
    }

    pub fn from_winecfg_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.winecfg_key() == key)
    }

    /// Look up a version by combobox index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for WindowsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WindowsVersion::WindowsXp => "Windows XP",
            WindowsVersion::WindowsVista => "Windows Vista",
            WindowsVersion::Windows7 => "Windows 7",
            WindowsVersion::Windows8 => "Windows 8",
            WindowsVersion::Windows81 => "Windows 8.1",
            WindowsVersion::Windows10 => "Windows 10",
            WindowsVersion::Windows11 => "Windows 11",
        };
        f.write_str(name)
    }
}

/// Bottle bitness. New bottles default to 64-bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bit {
    Win32,
    #[default]
    Win64,
}

impl Bit {
    pub const ALL: [Bit; 2] = [Bit::Win32, Bit::Win64];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The `WINEARCH` value for this bitness.
    pub fn winearch(self) -> &'static str {
        match self {
            Bit::Win32 => "win32",
            Bit::Win64 => "win64",
        }
    }
}

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bit::Win32 => f.write_str("32-bit"),
            Bit::Win64 => f.write_str("64-bit"),
        }
    }
}

/// Audio driver configured in the bottle's Wine registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioDriver {
    #[default]
    PulseAudio,
    Alsa,
    Oss,
    Disabled,
}

impl AudioDriver {
    pub const ALL: [AudioDriver; 4] = [
        AudioDriver::PulseAudio,
        AudioDriver::Alsa,
        AudioDriver::Oss,
        AudioDriver::Disabled,
    ];

    /// Value written to `HKCU\Software\Wine\Drivers\Audio`.
    pub fn registry_value(self) -> &'static str {
        match self {
            AudioDriver::PulseAudio => "pulse",
            AudioDriver::Alsa => "alsa",
            AudioDriver::Oss => "oss",
            AudioDriver::Disabled => "",
        }
    }

    pub fn from_registry_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.registry_value() == value)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for AudioDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AudioDriver::PulseAudio => "PulseAudio",
            AudioDriver::Alsa => "ALSA",
            AudioDriver::Oss => "OSS",
            AudioDriver::Disabled => "Disabled",
        };
        f.write_str(name)
    }
}

/// A Windows package installable into a bottle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Package {
    DirectX9,
    Dxvk,
    CoreFonts,
    LiberationFonts,
    DotNet,
    VisualCppRuntime,
}

impl Package {
    /// The winetricks verb performing the install.
    pub fn verb(self) -> &'static str {
        match self {
            Package::DirectX9 => "d3dx9",
            Package::Dxvk => "dxvk",
            Package::CoreFonts => "corefonts",
            Package::LiberationFonts => "liberation",
            Package::DotNet => "dotnet48",
            Package::VisualCppRuntime => "vcrun2019",
        }
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Package::DirectX9 => "DirectX 9 (D3DX9)",
            Package::Dxvk => "DXVK (Vulkan-based DirectX)",
            Package::CoreFonts => "MS core fonts",
            Package::LiberationFonts => "Liberation fonts",
            Package::DotNet => ".NET Framework",
            Package::VisualCppRuntime => "Visual C++ runtime",
        };
        f.write_str(name)
    }
}

/// A managed Wine bottle as known to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bottle {
    pub name: String,
    pub folder_name: String,
    pub description: String,
    /// Absolute prefix directory backing this bottle.
    pub prefix: Utf8PathBuf,
    pub windows_version: WindowsVersion,
    pub bit: Bit,
    /// `None` means virtual desktop mode is off.
    pub virtual_desktop_resolution: Option<String>,
    pub audio_driver: AudioDriver,
    pub is_debug_logging: bool,
    pub debug_log_level: u8,
}

/// Everything needed to create a new bottle, captured from the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBottleSpec {
    pub name: String,
    pub windows_version: WindowsVersion,
    pub bit: Bit,
    pub virtual_desktop_resolution: Option<String>,
    pub disable_gecko_mono: bool,
    pub audio_driver: AudioDriver,
}

/// Everything needed to update an existing bottle, captured from the edit
/// window. Assembled once on the GUI thread and handed unchanged into the
/// background task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRecord {
    pub name: String,
    pub folder_name: String,
    pub description: String,
    pub windows_version: WindowsVersion,
    pub virtual_desktop_resolution: Option<String>,
    pub audio_driver: AudioDriver,
    pub is_debug_logging: bool,
    pub debug_log_level: u8,
}

/// A package install request targeting one bottle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInstall {
    pub bottle: String,
    pub package: Package,
}

/// A request to launch a Windows program inside a bottle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunProgramRequest {
    pub bottle: String,
    pub program: String,
}
