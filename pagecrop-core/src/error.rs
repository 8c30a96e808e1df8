use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PagecropError {
    #[snafu(display("Invalid config `{}`: {}", name, message))]
    Config { name: String, message: String },
    #[snafu(display(
        "Malformed bbox ({}, {})-({}, {}): coordinates must satisfy x1 < x2 and y1 < y2",
        x1,
        y1,
        x2,
        y2
    ))]
    Geometry { x1: f32, y1: f32, x2: f32, y2: f32 },
    #[snafu(display("Unknown detector label `{}`", name))]
    Label { name: String },
    #[snafu(display("Detector batch mismatch: {}", message))]
    DetectorMismatch { message: String },
    #[snafu(display("Image write `{}` error: {}", path, source))]
    ImageWrite {
        source: image::ImageError,
        path: String,
    },
    #[snafu(display("Image read `{}` error: {}", path, source))]
    ImageRead {
        source: image::ImageError,
        path: String,
    },
    #[snafu(display("Write `{}` error: {}", path, source))]
    IoWrite {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Read `{}` error: {}", path, source))]
    IoRead {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Decode predictions json error: {}", source))]
    Json { source: serde_json::Error },
}
