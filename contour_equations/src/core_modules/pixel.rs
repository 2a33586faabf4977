// THEORY (Pixel Intensity):
// The `Pixel` module is the most fundamental unit of the engine. It is a "dumb"
// data container for a single decoded RGB sample plus the one single-pixel metric
// the edge stage needs: luminance.
//
// Key principles:
// 1) Single-pixel scope: nothing here reads neighbors. Smoothing and gradients live
//    in the `edge_detector`.
// 2) Rec. 601 luma: the grayscale weights are the classic 0.299 / 0.587 / 0.114 on
//    gamma-encoded channels. This is what common image toolkits use for their
//    color-to-gray conversion, so edge maps line up with what users expect.
// 3) Alpha is not represented. Decoding drops it before pixels are built.

pub mod pixel {
    pub type Channel = u8;
    pub type Luminance = f64;

    const CHANNELS: usize = 3;

    /// A "dumb" data container representing a single RGB pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel { red, green, blue }
        }

        /// Perceived brightness on the 0..255 scale (Rec. 601 weights).
        pub fn luminance(&self) -> Luminance {
            0.299_f64 * self.red as f64 + 0.587_f64 * self.green as f64 + 0.114_f64 * self.blue as f64
        }

        /// Luminance rounded to the nearest byte, ready for a gray raster.
        pub fn gray(&self) -> Channel {
            self.luminance().round().clamp(0.0, 255.0) as Channel
        }
    }

    impl TryFrom<&[u8]> for Pixel {
        type Error = usize;

        /// Builds a pixel from an interleaved RGB triple. The error is the slice length.
        fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
            if bytes.len() != CHANNELS {
                return Err(bytes.len());
            }
            Ok(Pixel::new(bytes[0], bytes[1], bytes[2]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::*;

    #[test]
    fn pure_white_and_black() {
        assert_eq!(Pixel::new(255, 255, 255).gray(), 255);
        assert_eq!(Pixel::new(0, 0, 0).gray(), 0);
    }

    #[test]
    fn green_dominates_luma() {
        let green = Pixel::new(0, 255, 0).luminance();
        let red = Pixel::new(255, 0, 0).luminance();
        let blue = Pixel::new(0, 0, 255).luminance();
        assert!(green > red && red > blue);
        assert_eq!(Pixel::new(255, 0, 0).gray(), 76);
    }

    #[test]
    fn slice_conversion_checks_length() {
        assert_eq!(Pixel::try_from(&[1u8, 2, 3][..]), Ok(Pixel::new(1, 2, 3)));
        assert_eq!(Pixel::try_from(&[1u8, 2, 3, 4][..]), Err(4));
    }
}
