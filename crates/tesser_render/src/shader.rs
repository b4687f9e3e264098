//! Shader source bundles
//!
//! A program is described once as a [`ShaderSource`] carrying both dialects;
//! each backend picks the half it understands. GLSL halves carry no
//! `#version` line: the GL backend prepends the header for its context's
//! [`GlslDialect`].

use std::borrow::Cow;

/// GLSL flavor spoken by a GL context
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlslDialect {
    /// Desktop OpenGL 3.3 core
    Desktop,
    /// OpenGL ES 3.0 / WebGL2
    Es,
}

impl GlslDialect {
    pub fn header(self) -> &'static str {
        match self {
            GlslDialect::Desktop => "#version 330 core\n",
            GlslDialect::Es => "#version 300 es\nprecision highp float;\nprecision highp int;\n",
        }
    }

    /// `body` with this dialect's header in front
    pub fn complete(self, body: &str) -> String {
        let mut out = String::with_capacity(self.header().len() + body.len());
        out.push_str(self.header());
        out.push_str(body);
        out
    }
}

/// GLSL vertex/fragment pair plus the equivalent WGSL module
///
/// The WGSL module must expose `vs_main` and `fs_main` entry points and read
/// its uniforms from `@group(0) @binding(0)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderSource {
    pub glsl_vertex: Cow<'static, str>,
    pub glsl_fragment: Cow<'static, str>,
    pub wgsl: Cow<'static, str>,
}

impl ShaderSource {
    pub fn new(
        glsl_vertex: impl Into<Cow<'static, str>>,
        glsl_fragment: impl Into<Cow<'static, str>>,
        wgsl: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            glsl_vertex: glsl_vertex.into(),
            glsl_fragment: glsl_fragment.into(),
            wgsl: wgsl.into(),
        }
    }

    /// The fullscreen 4D lattice visualizer
    pub fn builtin_visualizer() -> Self {
        Self::new(
            include_str!("shaders/visualizer.vert"),
            include_str!("shaders/visualizer.frag"),
            include_str!("shaders/visualizer.wgsl"),
        )
    }

    /// Projected geometry drawn over the visualizer
    ///
    /// Reads a 3-float position at location 0 and an RGBA color at
    /// location 1.
    pub fn builtin_mesh() -> Self {
        Self::new(
            include_str!("shaders/mesh.vert"),
            include_str!("shaders/mesh.frag"),
            include_str!("shaders/mesh.wgsl"),
        )
    }

    /// Total source size in bytes, used as a memory estimate
    pub fn byte_len(&self) -> usize {
        self.glsl_vertex.len() + self.glsl_fragment.len() + self.wgsl.len()
    }
}
