// sRGB <-> linear lookup tables for the brush's anti-aliased edge.
// Visual: stroke edges fade from ink to paper without looking thin or dark-rimmed.

pub struct GammaLut {
    // sRGB(0..255) -> linear (0..1)
    srgb_to_linear: [f32; 256],
    // linear(0..1) -> sRGB(0..255), 4096 steps (index = (linear * 4095).round())
    linear_to_srgb: [u8; 4096],
}

impl Default for GammaLut {
    fn default() -> Self {
        Self::new()
    }
}

impl GammaLut {
    /// Build both tables once; the surface keeps one for its lifetime.
    pub fn new() -> Self {
        let mut s2l = [0.0f32; 256];
        for (v, slot) in s2l.iter_mut().enumerate() {
            let c = v as f32 / 255.0;
            *slot = if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) };
        }

        let mut l2s = [0u8; 4096];
        for (i, slot) in l2s.iter_mut().enumerate() {
            let l = i as f32 / 4095.0;
            let s = if l <= 0.003_130_8 { 12.92 * l } else { 1.055 * l.powf(1.0 / 2.4) - 0.055 };
            *slot = (s * 255.0).round().clamp(0.0, 255.0) as u8;
        }

        Self { srgb_to_linear: s2l, linear_to_srgb: l2s }
    }

    #[inline]
    pub fn srgb_u8_to_linear(&self, v: u8) -> f32 {
        self.srgb_to_linear[v as usize]
    }

    #[inline]
    pub fn linear_to_srgb_u8(&self, l: f32) -> u8 {
        let idx = (l.clamp(0.0, 1.0) * 4095.0).round() as usize;
        self.linear_to_srgb[idx]
    }

    /// Mix two 0x00RRGGBB colors in linear light; `t = 0` gives `under`,
    /// `t = 1` gives `over`.
    pub fn mix(&self, under: u32, over: u32, t: f32) -> u32 {
        if t <= 0.0 {
            return under;
        }
        if t >= 1.0 {
            return over;
        }
        let mut out = 0u32;
        for shift in [16u32, 8, 0] {
            let a = self.srgb_u8_to_linear(((under >> shift) & 0xFF) as u8);
            let b = self.srgb_u8_to_linear(((over >> shift) & 0xFF) as u8);
            let c = self.linear_to_srgb_u8(a + (b - a) * t) as u32;
            out |= c << shift;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_round_trip() {
        let lut = GammaLut::new();
        assert_eq!(lut.linear_to_srgb_u8(lut.srgb_u8_to_linear(0)), 0);
        assert_eq!(lut.linear_to_srgb_u8(lut.srgb_u8_to_linear(255)), 255);
    }

    #[test]
    fn mix_half_is_brighter_than_naive_average() {
        let lut = GammaLut::new();
        let mid = lut.mix(0x00FF_FFFF, 0x0000_0000, 0.5);
        // Linear-light 50% of white is ~188 in sRGB, not 128.
        let r = (mid >> 16) & 0xFF;
        assert!(r > 170 && r < 200, "got {r}");
        assert_eq!(lut.mix(0x00FF_FFFF, 0, 0.0), 0x00FF_FFFF);
        assert_eq!(lut.mix(0x00FF_FFFF, 0, 1.0), 0);
    }
}
