use ndarray::ArrayView3;

/// One captured camera frame or overlay bitmap: interleaved 8-bit pixels in
/// row-major order, either RGB (3 channels) or RGBA (4 channels).
///
/// Decoding and encoding happen in the `video` and `overlay` adapters; the
/// classifier and compositor only ever see this type.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// A frame of the given size with every pixel set to `pixel`.
    pub fn filled(width: u32, height: u32, pixel: &[u8], index: usize) -> Self {
        let data = pixel.repeat((width as usize) * (height as usize));
        Self::new(data, width, height, pixel.len() as u8, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn has_alpha(&self) -> bool {
        self.channels == 4
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Channel values of the pixel at column `x`, row `y`.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let c = self.channels as usize;
        let offset = ((y as usize) * (self.width as usize) + x as usize) * c;
        &self.data[offset..offset + c]
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
