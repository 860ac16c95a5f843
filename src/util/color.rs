use nannou::color::*;

/// Sample a colorous gradient at [t], clamped to \[0, 1\], as a nannou color.
pub fn gradient_rgb(gradient: colorous::Gradient, t: f32) -> Rgb<u8> {
    let c = gradient.eval_continuous(t.clamp(0.0, 1.0) as f64);
    Rgb::from(c.as_tuple())
}
