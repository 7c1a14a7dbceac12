//! Packet geometry and elementary-cell index conversions.

use std::fmt;

use crate::error::ShowersetError;

/// Geometry of a detector packet: `num_frames` frames of
/// `frame_height × frame_width` pixels, tiled by elementary cells (ECs) of
/// `ec_height × ec_width` pixels.
///
/// All dimensions are positive and the EC dimensions divide the frame
/// dimensions exactly. Both properties are checked once, at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PacketTemplate {
    ec_width: usize,
    ec_height: usize,
    frame_width: usize,
    frame_height: usize,
    num_frames: usize,
}

impl PacketTemplate {
    /// Creates a new template.
    ///
    /// # Errors
    /// Returns [`ShowersetError::InvalidGeometry`] if any dimension is zero or
    /// if an EC dimension does not divide the matching frame dimension.
    pub fn new(
        ec_width: usize,
        ec_height: usize,
        frame_width: usize,
        frame_height: usize,
        num_frames: usize,
    ) -> Result<Self, ShowersetError> {
        let dims = [
            ("ec_width", ec_width),
            ("ec_height", ec_height),
            ("frame_width", frame_width),
            ("frame_height", frame_height),
            ("num_frames", num_frames),
        ];
        if let Some((name, _)) = dims.iter().find(|(_, value)| *value == 0) {
            return Err(ShowersetError::InvalidGeometry {
                message: format!("{} must be at least 1", name),
            });
        }

        if frame_width % ec_width != 0 {
            return Err(ShowersetError::InvalidGeometry {
                message: format!(
                    "frame_width {} is not divisible by ec_width {}",
                    frame_width, ec_width
                ),
            });
        }
        if frame_height % ec_height != 0 {
            return Err(ShowersetError::InvalidGeometry {
                message: format!(
                    "frame_height {} is not divisible by ec_height {}",
                    frame_height, ec_height
                ),
            });
        }

        Ok(Self {
            ec_width,
            ec_height,
            frame_width,
            frame_height,
            num_frames,
        })
    }

    /// Creates a template whose single elementary cell covers the whole frame.
    pub fn single_cell(
        num_frames: usize,
        frame_height: usize,
        frame_width: usize,
    ) -> Result<Self, ShowersetError> {
        Self::new(frame_width, frame_height, frame_width, frame_height, num_frames)
    }

    /// Creates a single-cell template from a `(frames, height, width)` shape.
    pub fn from_packet_shape(shape: [usize; 3]) -> Result<Self, ShowersetError> {
        Self::single_cell(shape[0], shape[1], shape[2])
    }

    #[inline]
    pub fn ec_width(&self) -> usize {
        self.ec_width
    }

    #[inline]
    pub fn ec_height(&self) -> usize {
        self.ec_height
    }

    #[inline]
    pub fn frame_width(&self) -> usize {
        self.frame_width
    }

    #[inline]
    pub fn frame_height(&self) -> usize {
        self.frame_height
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Number of EC columns across a frame.
    #[inline]
    pub fn num_cols(&self) -> usize {
        self.frame_width / self.ec_width
    }

    /// Number of EC rows down a frame.
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.frame_height / self.ec_height
    }

    /// Total number of elementary cells in a frame.
    #[inline]
    pub fn num_ec(&self) -> usize {
        self.num_cols() * self.num_rows()
    }

    /// The packet shape as `(num_frames, frame_height, frame_width)`.
    #[inline]
    pub fn packet_shape(&self) -> [usize; 3] {
        [self.num_frames, self.frame_height, self.frame_width]
    }

    /// EC column containing pixel column `x`.
    #[inline]
    pub fn x_to_ec_x(&self, x: usize) -> usize {
        x / self.ec_width
    }

    /// EC row containing pixel row `y`.
    #[inline]
    pub fn y_to_ec_y(&self, y: usize) -> usize {
        y / self.ec_height
    }

    /// Row-major EC index of the cell at `(ec_x, ec_y)`.
    #[inline]
    pub fn ec_xy_to_ec_idx(&self, ec_x: usize, ec_y: usize) -> usize {
        ec_x + self.num_cols() * ec_y
    }

    /// Inverse of [`ec_xy_to_ec_idx`](Self::ec_xy_to_ec_idx).
    #[inline]
    pub fn ec_idx_to_ec_xy(&self, ec_idx: usize) -> (usize, usize) {
        (ec_idx % self.num_cols(), ec_idx / self.num_cols())
    }

    /// EC index of the cell containing pixel `(x, y)`.
    #[inline]
    pub fn xy_to_ec_idx(&self, x: usize, y: usize) -> usize {
        self.ec_xy_to_ec_idx(self.x_to_ec_x(x), self.y_to_ec_y(y))
    }
}

impl fmt::Display for PacketTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}x{} (EC {}x{})",
            self.num_frames, self.frame_height, self.frame_width, self.ec_height, self.ec_width
        )
    }
}
