use image::{
    Rgb, RgbImage,
    imageops::{self, FilterType},
};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{
    error::{DetectorError, Result},
    image_utils::normalize_unit,
    report::glyphs::{draw_text, text_height, text_width},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    Magma,
    HeatMap,
    Viridis,
    Grayscale,
}

// Samples of matplotlib's magma at t = 0, 1/8, ..., 1.
const MAGMA: [(f32, f32, f32); 9] = [
    (0.001462, 0.000466, 0.013866),
    (0.078815, 0.054184, 0.211667),
    (0.232077, 0.059889, 0.437695),
    (0.390384, 0.100379, 0.501864),
    (0.550287, 0.161158, 0.505719),
    (0.716387, 0.214982, 0.475290),
    (0.868793, 0.287728, 0.409303),
    (0.986700, 0.535582, 0.382210),
    (0.987053, 0.991438, 0.749504),
];

// Samples of matplotlib's viridis at the same positions.
const VIRIDIS: [(f32, f32, f32); 9] = [
    (0.267004, 0.004874, 0.329415),
    (0.282623, 0.140926, 0.457517),
    (0.229739, 0.322361, 0.545706),
    (0.172719, 0.448791, 0.557885),
    (0.127568, 0.566949, 0.550556),
    (0.134692, 0.658636, 0.517649),
    (0.369214, 0.788888, 0.382914),
    (0.678489, 0.863742, 0.189503),
    (0.993248, 0.906157, 0.143936),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    pub color_scheme: ColorScheme,
    /// Side of the square output figure in pixels.
    pub figure_size: u32,
    pub background: [u8; 3],
    pub title: String,
    pub colorbar_label: String,
    pub show_colorbar: bool,
    pub tick_count: usize,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            color_scheme: ColorScheme::Magma,
            figure_size: 600,
            background: [0x1a, 0x1a, 0x1a],
            title: "Frequency Domain Analysis".into(),
            colorbar_label: "Magnitude (log scale)".into(),
            show_colorbar: true,
            tick_count: 5,
        }
    }
}

const TITLE_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS_COLOR: Rgb<u8> = Rgb([0xaa, 0xaa, 0xaa]);
const MARGIN: u32 = 20;
const TITLE_SCALE: u32 = 2;
const BAR_GAP: u32 = 12;
const BAR_WIDTH: u32 = 16;
const TICK_LENGTH: u32 = 4;
const MIN_FIGURE_SIZE: u32 = 200;

pub struct Visualizer {
    config: VisualizationConfig,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            config: VisualizationConfig::default(),
        }
    }

    pub fn with_config(config: VisualizationConfig) -> Self {
        Self { config }
    }

    /// Colours every cell of `values`, scaled between the grid's own min and max.
    pub fn create_heatmap(&self, values: &Array2<f64>) -> RgbImage {
        let (height, width) = values.dim();
        let (unit, _, _) = normalize_unit(values);
        let mut heatmap = RgbImage::new(width as u32, height as u32);

        for ((y, x), &v) in unit.indexed_iter() {
            heatmap.put_pixel(x as u32, y as u32, self.intensity_to_color(v as f32));
        }

        heatmap
    }

    /// Renders the full figure: title, heat-map and labelled colour bar.
    pub fn render_spectrum(&self, log_magnitude: &Array2<f64>) -> Result<RgbImage> {
        let (rows, cols) = log_magnitude.dim();
        if rows == 0 || cols == 0 {
            return Err(DetectorError::Render("Empty spectrum".into()));
        }

        let size = self.config.figure_size;
        if size < MIN_FIGURE_SIZE {
            return Err(DetectorError::Render(format!(
                "Figure size must be at least {}",
                MIN_FIGURE_SIZE
            )));
        }

        let mut figure = RgbImage::from_pixel(size, size, Rgb(self.config.background));

        let title_top = MARGIN / 2;
        let title_width = text_width(&self.config.title, TITLE_SCALE);
        draw_text(
            &mut figure,
            size.saturating_sub(title_width) / 2,
            title_top,
            &self.config.title,
            TITLE_COLOR,
            TITLE_SCALE,
        );

        let (_, min, max) = normalize_unit(log_magnitude);
        let tick_labels = self.tick_labels(min, max);
        let label_width = tick_labels
            .iter()
            .map(|label| text_width(label, 1))
            .max()
            .unwrap_or(0);

        let colorbar_width = if self.config.show_colorbar {
            BAR_GAP + BAR_WIDTH + TICK_LENGTH + 4 + label_width + 6 + text_height(1)
        } else {
            0
        };

        let area_x = MARGIN;
        let area_y = title_top + text_height(TITLE_SCALE) + MARGIN;
        let area_w = size.saturating_sub(2 * MARGIN + colorbar_width).max(1);
        let area_h = size.saturating_sub(area_y + MARGIN).max(1);

        let scale = (area_w as f64 / cols as f64).min(area_h as f64 / rows as f64);
        let plot_w = ((cols as f64 * scale).round() as u32).max(1);
        let plot_h = ((rows as f64 * scale).round() as u32).max(1);
        let plot_x = area_x + (area_w - plot_w.min(area_w)) / 2;
        let plot_y = area_y + (area_h - plot_h.min(area_h)) / 2;

        let heatmap = self.create_heatmap(log_magnitude);
        let scaled = imageops::resize(&heatmap, plot_w, plot_h, FilterType::Nearest);
        self.copy_image_to(&mut figure, &scaled, plot_x, plot_y);

        if self.config.show_colorbar {
            let bar_x = plot_x + plot_w + BAR_GAP;
            self.draw_colorbar(&mut figure, bar_x, plot_y, plot_h, &tick_labels, label_width);
        }

        Ok(figure)
    }

    fn tick_labels(&self, min: f64, max: f64) -> Vec<String> {
        let count = self.config.tick_count.max(2);
        (0..count)
            .map(|i| {
                let t = i as f64 / (count - 1) as f64;
                format!("{:.1}", min + t * (max - min))
            })
            .collect()
    }

    fn draw_colorbar(
        &self,
        figure: &mut RgbImage,
        bar_x: u32,
        bar_y: u32,
        bar_h: u32,
        tick_labels: &[String],
        label_width: u32,
    ) {
        for dy in 0..bar_h {
            let t = if bar_h > 1 {
                1.0 - dy as f32 / (bar_h - 1) as f32
            } else {
                1.0
            };
            let color = self.intensity_to_color(t);
            draw_filled_rect_mut(
                figure,
                Rect::at(bar_x as i32, (bar_y + dy) as i32).of_size(BAR_WIDTH, 1),
                color,
            );
        }

        let ticks = tick_labels.len();
        for (i, label) in tick_labels.iter().enumerate() {
            let offset = if ticks > 1 {
                (bar_h.saturating_sub(1) as f64 * i as f64 / (ticks - 1) as f64).round() as u32
            } else {
                0
            };
            let tick_y = bar_y + bar_h.saturating_sub(1) - offset;

            draw_filled_rect_mut(
                figure,
                Rect::at((bar_x + BAR_WIDTH) as i32, tick_y as i32).of_size(TICK_LENGTH, 1),
                AXIS_COLOR,
            );

            let text_y = tick_y.saturating_sub(text_height(1) / 2);
            draw_text(figure, bar_x + BAR_WIDTH + TICK_LENGTH + 4, text_y, label, AXIS_COLOR, 1);
        }

        let label = &self.config.colorbar_label;
        let mut horizontal = RgbImage::from_pixel(
            text_width(label, 1).max(1),
            text_height(1),
            Rgb(self.config.background),
        );
        draw_text(&mut horizontal, 0, 0, label, AXIS_COLOR, 1);
        let vertical = imageops::rotate270(&horizontal);

        let label_x = bar_x + BAR_WIDTH + TICK_LENGTH + 4 + label_width + 6;
        let label_y = bar_y + bar_h.saturating_sub(vertical.height()) / 2;
        self.copy_image_to(figure, &vertical, label_x, label_y);
    }

    fn intensity_to_color(&self, intensity: f32) -> Rgb<u8> {
        let intensity = intensity.clamp(0.0, 1.0);

        match self.config.color_scheme {
            ColorScheme::Magma => {
                let (r, g, b) = Self::sample_colormap(&MAGMA, intensity);
                Rgb([(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8])
            }
            ColorScheme::HeatMap => {
                let (r, g, b) = if intensity < 0.25 {
                    let t = intensity / 0.25;
                    (0.0, t, 1.0)
                } else if intensity < 0.5 {
                    let t = (intensity - 0.25) / 0.25;
                    (0.0, 1.0, 1.0 - t)
                } else if intensity < 0.75 {
                    let t = (intensity - 0.5) / 0.25;
                    (t, 1.0, 0.0)
                } else {
                    let t = (intensity - 0.75) / 0.25;
                    (1.0, 1.0 - t, 0.0)
                };
                Rgb([(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8])
            }
            ColorScheme::Viridis => {
                let (r, g, b) = Self::sample_colormap(&VIRIDIS, intensity);
                Rgb([(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8])
            }
            ColorScheme::Grayscale => {
                let v = (intensity * 255.0) as u8;
                Rgb([v, v, v])
            }
        }
    }

    /// Linear interpolation between evenly spaced colormap samples.
    fn sample_colormap(table: &[(f32, f32, f32)], t: f32) -> (f32, f32, f32) {
        let scaled = t * (table.len() - 1) as f32;
        let lower = (scaled.floor() as usize).min(table.len() - 2);
        let frac = scaled - lower as f32;
        let (r0, g0, b0) = table[lower];
        let (r1, g1, b1) = table[lower + 1];

        (
            r0 + (r1 - r0) * frac,
            g0 + (g1 - g0) * frac,
            b0 + (b1 - b0) * frac,
        )
    }

    /// Places labelled panels side by side on the figure background.
    pub fn create_comparison(&self, images: &[(&str, &RgbImage)]) -> RgbImage {
        if images.is_empty() {
            return RgbImage::new(1, 1);
        }

        let padding = 10u32;
        let label_height = text_height(1) + padding;

        let max_height = images
            .iter()
            .map(|(_, img)| img.height())
            .max()
            .unwrap_or(0);

        let total_width = images
            .iter()
            .map(|(_, img)| img.width())
            .sum::<u32>()
            + padding * (images.len() as u32 + 1);
        let total_height = max_height + label_height + padding * 2;

        let mut result =
            RgbImage::from_pixel(total_width, total_height, Rgb(self.config.background));

        let mut x_offset = padding;
        for (label, img) in images {
            draw_text(&mut result, x_offset, padding, label, TITLE_COLOR, 1);
            self.copy_image_to(&mut result, img, x_offset, label_height + padding);
            x_offset += img.width() + padding;
        }

        result
    }

    fn copy_image_to(&self, dest: &mut RgbImage, src: &RgbImage, offset_x: u32, offset_y: u32) {
        let (dest_w, dest_h) = dest.dimensions();
        let (src_w, src_h) = src.dimensions();

        for y in 0..src_h {
            for x in 0..src_w {
                let dx = offset_x + x;
                let dy = offset_y + y;
                if dx < dest_w && dy < dest_h {
                    dest.put_pixel(dx, dy, *src.get_pixel(x, y));
                }
            }
        }
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_figure_is_square_with_dark_background() {
        let values = Array2::from_shape_fn((64, 64), |(y, x)| (x + y) as f64);
        let figure = Visualizer::new().render_spectrum(&values).unwrap();
        assert_eq!(figure.dimensions(), (600, 600));
        assert_eq!(*figure.get_pixel(0, 0), Rgb([0x1a, 0x1a, 0x1a]));
    }

    #[test]
    fn test_magma_endpoints() {
        let visualizer = Visualizer::new();
        assert_eq!(visualizer.intensity_to_color(0.0), Rgb([0, 0, 3]));
        let top = visualizer.intensity_to_color(1.0);
        assert!(top[0] > 240 && top[1] > 240);
    }

    fn scheme(color_scheme: ColorScheme) -> Visualizer {
        Visualizer::with_config(VisualizationConfig {
            color_scheme,
            ..VisualizationConfig::default()
        })
    }

    #[test]
    fn test_viridis_follows_reference_samples() {
        let viridis = scheme(ColorScheme::Viridis);
        assert_eq!(viridis.intensity_to_color(0.0), Rgb([68, 1, 84]));
        assert_eq!(viridis.intensity_to_color(0.5), Rgb([32, 144, 140]));
        assert_eq!(viridis.intensity_to_color(1.0), Rgb([253, 231, 36]));
    }

    #[test]
    fn test_heat_map_runs_blue_to_red() {
        let heat = scheme(ColorScheme::HeatMap);
        assert_eq!(heat.intensity_to_color(0.0), Rgb([0, 0, 255]));
        assert_eq!(heat.intensity_to_color(0.5), Rgb([0, 255, 0]));
        assert_eq!(heat.intensity_to_color(1.0), Rgb([255, 0, 0]));
    }

    #[test]
    fn test_grayscale_is_neutral() {
        let gray = scheme(ColorScheme::Grayscale);
        assert_eq!(gray.intensity_to_color(0.0), Rgb([0, 0, 0]));
        assert_eq!(gray.intensity_to_color(0.5), Rgb([127, 127, 127]));
        assert_eq!(gray.intensity_to_color(1.0), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_heatmap_uses_configured_scheme() {
        let values = Array2::from_shape_vec((1, 3), vec![0.0, 0.5, 1.0]).unwrap();
        let heatmap = scheme(ColorScheme::Viridis).create_heatmap(&values);
        assert_eq!(*heatmap.get_pixel(1, 0), Rgb([32, 144, 140]));
        assert_eq!(*heatmap.get_pixel(2, 0), Rgb([253, 231, 36]));
    }

    #[test]
    fn test_tiny_figure_is_rejected() {
        let config = VisualizationConfig {
            figure_size: 50,
            ..VisualizationConfig::default()
        };
        let values = Array2::from_elem((8, 8), 1.0);
        assert!(Visualizer::with_config(config).render_spectrum(&values).is_err());
    }

    #[test]
    fn test_tick_labels_span_range() {
        let labels = Visualizer::new().tick_labels(0.0, 10.0);
        assert_eq!(labels, vec!["0.0", "2.5", "5.0", "7.5", "10.0"]);
    }
}
