//! Depth and stencil state
//!
//! Carried per render object and applied dynamically by the command list
//! when it differs from the previously bound state.

/// Comparison used by depth and stencil tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

impl CompareFunction {
    /// Evaluate the comparison on two depth values (`incoming` against `stored`)
    pub fn passes(&self, incoming: f32, stored: f32) -> bool {
        match self {
            CompareFunction::Never => false,
            CompareFunction::Less => incoming < stored,
            CompareFunction::Equal => incoming == stored,
            CompareFunction::LessEqual => incoming <= stored,
            CompareFunction::Greater => incoming > stored,
            CompareFunction::NotEqual => incoming != stored,
            CompareFunction::GreaterEqual => incoming >= stored,
            CompareFunction::Always => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthState {
    pub test_enable: bool,
    pub write_enable: bool,
    pub compare: CompareFunction,
}

impl DepthState {
    /// Test and write, nearer wins
    pub const fn default_opaque() -> Self {
        Self { test_enable: true, write_enable: true, compare: CompareFunction::Less }
    }

    /// Test without writing, so later transparent surfaces still blend
    pub const fn transparent() -> Self {
        Self { test_enable: true, write_enable: false, compare: CompareFunction::Less }
    }

    /// Drawn at the far plane behind everything already written
    pub const fn skybox() -> Self {
        Self { test_enable: true, write_enable: false, compare: CompareFunction::LessEqual }
    }

    pub const fn overlay() -> Self {
        Self { test_enable: false, write_enable: false, compare: CompareFunction::Always }
    }

    pub const fn disabled() -> Self {
        Self::overlay()
    }
}

impl Default for DepthState {
    fn default() -> Self {
        Self::default_opaque()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrementClamp,
    DecrementClamp,
    Invert,
    IncrementWrap,
    DecrementWrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilState {
    pub enable: bool,
    pub compare: CompareFunction,
    pub reference: u32,
    pub read_mask: u32,
    pub write_mask: u32,
    pub fail_op: StencilOp,
    pub pass_op: StencilOp,
    pub depth_fail_op: StencilOp,
}

impl StencilState {
    pub const fn disabled() -> Self {
        Self {
            enable: false,
            compare: CompareFunction::Always,
            reference: 0,
            read_mask: 0xFF,
            write_mask: 0xFF,
            fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
        }
    }

    /// Write `reference` wherever the object draws
    pub const fn write(reference: u32) -> Self {
        Self {
            enable: true,
            compare: CompareFunction::Always,
            reference,
            read_mask: 0xFF,
            write_mask: 0xFF,
            fail_op: StencilOp::Keep,
            pass_op: StencilOp::Replace,
            depth_fail_op: StencilOp::Keep,
        }
    }
}

impl Default for StencilState {
    fn default() -> Self {
        Self::disabled()
    }
}
