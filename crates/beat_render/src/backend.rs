use std::fmt;

/// Graphics backends the selector can construct, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// The platform's native modern API (Vulkan, Metal or DX12).
    Native,
    /// OpenGL / GLES. Slower, but runs on hardware the native API rejects.
    Gl,
}

impl BackendKind {
    pub const PRIMARY: BackendKind = BackendKind::Native;
    pub const ALL: &'static [BackendKind] = &[BackendKind::Native, BackendKind::Gl];

    /// Case-insensitive lookup of a configured backend name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "native" | "wgpu" => Some(Self::Native),
            "gl" | "opengl" => Some(Self::Gl),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Gl => "opengl",
        }
    }

    /// The backend to try when this one fails or is unaccelerated.
    pub fn fallback(self) -> Option<Self> {
        match self {
            Self::Native => Some(Self::Gl),
            Self::Gl => None,
        }
    }

    pub fn wgpu_backends(self) -> wgpu::Backends {
        match self {
            Self::Native => wgpu::Backends::PRIMARY,
            Self::Gl => wgpu::Backends::GL,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
