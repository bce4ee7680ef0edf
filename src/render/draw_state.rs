use anyhow::anyhow;
use macroquad::material::{
    gl_use_default_material, gl_use_material, load_material, Material, MaterialParams,
};
use macroquad::miniquad::{ShaderSource, UniformDesc, UniformType};

/// Alpha test that keeps texels whose alpha is strictly greater than
/// `reference`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlphaTest {
    pub reference: u8,
}

/// A stack of render-state overrides owned by the host.
pub trait DrawStateStack {
    fn push_alpha_test(&mut self, test: AlphaTest);
    fn pop_state(&mut self);
}

/// Pushes an override on creation and pops it when dropped.
pub struct DrawStateScope<'a, S: DrawStateStack + ?Sized> {
    stack: &'a mut S,
}

impl<'a, S: DrawStateStack + ?Sized> DrawStateScope<'a, S> {
    pub fn alpha_test(stack: &'a mut S, test: AlphaTest) -> Self {
        stack.push_alpha_test(test);
        DrawStateScope { stack }
    }
}

impl<S: DrawStateStack + ?Sized> Drop for DrawStateScope<'_, S> {
    fn drop(&mut self) {
        self.stack.pop_state();
    }
}

const VERTEX: &str = r#"#version 100
attribute vec3 position;
attribute vec2 texcoord;
attribute vec4 color0;

varying lowp vec2 uv;
varying lowp vec4 color;

uniform mat4 Model;
uniform mat4 Projection;

void main() {
    gl_Position = Projection * Model * vec4(position, 1);
    color = color0 / 255.0;
    uv = texcoord;
}
"#;

const FRAGMENT: &str = r#"#version 100
precision lowp float;

varying vec4 color;
varying vec2 uv;

uniform sampler2D Texture;
uniform float reference_alpha;

void main() {
    vec4 texel = texture2D(Texture, uv) * color;
    if (texel.a <= reference_alpha) {
        discard;
    }
    gl_FragColor = texel;
}
"#;

/// Macroquad-backed [`DrawStateStack`]: a discard shader for the alpha test.
/// Needs a live GL context.
pub struct AlphaTestMaterial {
    material: Material,
    stack: Vec<AlphaTest>,
}

impl AlphaTestMaterial {
    pub fn new() -> anyhow::Result<Self> {
        let material = load_material(
            ShaderSource::Glsl {
                vertex: VERTEX,
                fragment: FRAGMENT,
            },
            MaterialParams {
                uniforms: vec![UniformDesc::new("reference_alpha", UniformType::Float1)],
                ..Default::default()
            },
        )
        .map_err(|err| anyhow!("compiling alpha-test material: {err:?}"))?;
        Ok(AlphaTestMaterial {
            material,
            stack: Vec::new(),
        })
    }

    fn apply(&self, test: AlphaTest) {
        self.material
            .set_uniform("reference_alpha", test.reference as f32 / 255.0);
        gl_use_material(&self.material);
    }
}

impl DrawStateStack for AlphaTestMaterial {
    fn push_alpha_test(&mut self, test: AlphaTest) {
        self.stack.push(test);
        self.apply(test);
    }

    fn pop_state(&mut self) {
        self.stack.pop();
        match self.stack.last() {
            Some(&previous) => self.apply(previous),
            None => gl_use_default_material(),
        }
    }
}
