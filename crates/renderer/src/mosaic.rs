//! Cell-averaging mosaic over a CPU copy of the rendered scene.

use thiserror::Error;

/// Byte order of the color channels in a readback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgba,
    Bgra,
}

impl ChannelOrder {
    /// Channel order of an 8-bit, 4-channel texture format.
    pub fn for_format(format: wgpu::TextureFormat) -> Option<Self> {
        use wgpu::TextureFormat as F;
        match format {
            F::Rgba8Unorm | F::Rgba8UnormSrgb => Some(ChannelOrder::Rgba),
            F::Bgra8Unorm | F::Bgra8UnormSrgb => Some(ChannelOrder::Bgra),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PixelViewError {
    #[error("row pitch {bytes_per_row} is smaller than {width} pixels")]
    RowTooShort { width: u32, bytes_per_row: u32 },
    #[error("buffer holds {len} bytes, {needed} needed for {width}x{height}")]
    BufferTooSmall {
        len: usize,
        needed: usize,
        width: u32,
        height: u32,
    },
}

/// Borrowed 4-byte-per-pixel image with an arbitrary row pitch.
#[derive(Debug, Clone, Copy)]
pub struct PixelView<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    bytes_per_row: u32,
    order: ChannelOrder,
}

impl<'a> PixelView<'a> {
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        bytes_per_row: u32,
        order: ChannelOrder,
    ) -> Result<Self, PixelViewError> {
        if (bytes_per_row as u64) < width as u64 * 4 {
            return Err(PixelViewError::RowTooShort { width, bytes_per_row });
        }
        let needed = if height == 0 {
            0
        } else {
            (height as usize - 1) * bytes_per_row as usize + width as usize * 4
        };
        if data.len() < needed {
            return Err(PixelViewError::BufferTooSmall {
                len: data.len(),
                needed,
                width,
                height,
            });
        }
        Ok(Self {
            data,
            width,
            height,
            bytes_per_row,
            order,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color of the pixel at `(x, y)` as `[r, g, b]`.
    pub fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let i = y as usize * self.bytes_per_row as usize + x as usize * 4;
        let px = &self.data[i..i + 4];
        match self.order {
            ChannelOrder::Rgba => [px[0], px[1], px[2]],
            ChannelOrder::Bgra => [px[2], px[1], px[0]],
        }
    }

    /// One row of pixels without padding.
    fn row(&self, y: u32) -> &'a [u8] {
        let start = y as usize * self.bytes_per_row as usize;
        &self.data[start..start + self.width as usize * 4]
    }
}

/// Pixel rectangle covered by one mosaic cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl CellRect {
    pub fn area(&self) -> u32 {
        self.w * self.h
    }
}

/// Square cells covering a `width` x `height` canvas. The last column and
/// row are truncated to whatever pixels remain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MosaicGrid {
    pub width: u32,
    pub height: u32,
    pub cell_size: u32,
    pub cols: u32,
    pub rows: u32,
}

impl MosaicGrid {
    pub fn new(width: u32, height: u32, cell_size: u32) -> Self {
        let cell_size = cell_size.max(1);
        Self {
            width,
            height,
            cell_size,
            cols: width.div_ceil(cell_size),
            rows: height.div_ceil(cell_size),
        }
    }

    pub fn len(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellRect> + '_ {
        let size = self.cell_size;
        (0..self.rows).flat_map(move |row| {
            (0..self.cols).map(move |col| {
                let x = col * size;
                let y = row * size;
                CellRect {
                    x,
                    y,
                    w: size.min(self.width - x),
                    h: size.min(self.height - y),
                }
            })
        })
    }
}

/// Mean color of a cell and the number of pixels that went into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellAverage {
    pub rgb: [u8; 3],
    pub samples: u32,
}

/// Average the pixels of `cell`, rounding each channel to nearest.
/// The part of the cell outside the view is ignored.
pub fn average_cell(view: &PixelView, cell: &CellRect) -> CellAverage {
    let x_end = (cell.x + cell.w).min(view.width());
    let y_end = (cell.y + cell.h).min(view.height());
    if cell.x >= x_end || cell.y >= y_end {
        return CellAverage { rgb: [0; 3], samples: 0 };
    }

    let (r, g, b) = match view.order {
        ChannelOrder::Rgba => (0, 1, 2),
        ChannelOrder::Bgra => (2, 1, 0),
    };
    let mut sum = [0u64; 3];
    for y in cell.y..y_end {
        let row = view.row(y);
        for px in row[cell.x as usize * 4..x_end as usize * 4].chunks_exact(4) {
            sum[0] += px[r] as u64;
            sum[1] += px[g] as u64;
            sum[2] += px[b] as u64;
        }
    }

    let n = ((x_end - cell.x) * (y_end - cell.y)) as u64;
    CellAverage {
        rgb: sum.map(|s| ((s + n / 2) / n) as u8),
        samples: n as u32,
    }
}

/// One painted mosaic rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MosaicCell {
    pub rect: CellRect,
    pub rgb: [u8; 3],
}

impl MosaicCell {
    /// Color as normalized floats with full alpha.
    pub fn color(&self) -> [f32; 4] {
        let [r, g, b] = self.rgb;
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
    }
}

/// Tile the view into cells of `cell_size` pixels and average each one.
pub fn mosaic(view: &PixelView, cell_size: u32) -> Vec<MosaicCell> {
    let grid = MosaicGrid::new(view.width(), view.height(), cell_size);
    let mut cells = Vec::with_capacity(grid.len());
    for rect in grid.cells() {
        let average = average_cell(view, &rect);
        cells.push(MosaicCell { rect, rgb: average.rgb });
    }
    cells
}
