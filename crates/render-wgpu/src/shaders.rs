/// WGSL shader for tessellated canvas geometry.
///
/// Every triangle carries an index into the paint table; the fragment stage
/// maps its pixel back to logical units and evaluates the radial gradient
/// there. A solid color is a single stop.
pub const PAINT_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
};

struct Paint {
    center: vec2<f32>,
    inv_scale: vec2<f32>,
    radius: f32,
    stop_count: u32,
    _pad: vec2<u32>,
    offsets: array<vec4<f32>, 2>,
    colors: array<vec4<f32>, 8>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@group(0) @binding(1)
var<storage, read> paints: array<Paint>;

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) paint: u32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) @interpolate(flat) paint: u32,
};

@vertex
fn vs_paint(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(in.position, 0.0, 1.0);
    out.paint = in.paint;
    return out;
}

fn stop_offset(paint: u32, i: u32) -> f32 {
    return paints[paint].offsets[i / 4u][i % 4u];
}

@fragment
fn fs_paint(in: VertexOutput) -> @location(0) vec4<f32> {
    let idx = in.paint;
    let count = paints[idx].stop_count;
    let radius = paints[idx].radius;
    let p = in.clip_position.xy * paints[idx].inv_scale;

    var t = 1.0;
    if (radius > 0.0) {
        t = clamp(distance(p, paints[idx].center) / radius, 0.0, 1.0);
    }

    var color = paints[idx].colors[0];
    for (var i = 1u; i < count; i = i + 1u) {
        let o0 = stop_offset(idx, i - 1u);
        let o1 = stop_offset(idx, i);
        if (t >= o1) {
            color = paints[idx].colors[i];
        } else if (t > o0) {
            let k = (t - o0) / max(o1 - o0, 1e-6);
            color = mix(paints[idx].colors[i - 1u], paints[idx].colors[i], k);
        }
    }
    return color;
}
"#;

/// WGSL shader that copies the persistent frame buffer to the swapchain
/// with a single full-screen triangle.
pub const BLIT_SHADER: &str = r#"
@group(0) @binding(0)
var frame_texture: texture_2d<f32>;

@group(0) @binding(1)
var frame_sampler: sampler;

struct BlitOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_blit(@builtin(vertex_index) index: u32) -> BlitOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: BlitOutput;
    out.clip_position = vec4<f32>(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, 0.0, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_blit(in: BlitOutput) -> @location(0) vec4<f32> {
    return textureSample(frame_texture, frame_sampler, in.uv);
}
"#;
