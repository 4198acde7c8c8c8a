use fractal_markers::detect;
use image::ImageReader;
use serde_json::json;

#[cfg(feature = "tracing")]
use fractal_markers_core::logger::init_tracing;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "tracing")]
    init_tracing(false);

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("Usage: detect_fractal <image_path> [config] [marker_size_m]");
        return Ok(());
    };
    let config = args.next().unwrap_or_else(|| "FRACTAL_4L_6".to_string());
    let marker_size = args.next().map(|s| s.parse::<f32>()).transpose()?;

    let img = ImageReader::open(&path)?.decode()?;
    let (detections, p3d, p2d) =
        detect::detect_fractal_correspondences(&img, &config, marker_size)?;

    let mut canvas = img.to_rgb8();
    for det in &detections {
        detect::draw_detection(&mut canvas, det, [255, 0, 0]);
    }
    let out_path = format!("{path}.detected.png");
    canvas.save(&out_path)?;

    let report = json!({
        "image": path,
        "config": config,
        "markers": detections
            .iter()
            .map(|d| {
                json!({
                    "id": d.id,
                    "corners": d.corners.iter().map(|c| [c.x, c.y]).collect::<Vec<_>>(),
                })
            })
            .collect::<Vec<_>>(),
        "correspondences": p2d.len(),
        "p3d_sample": p3d.first().map(|p| [p.x, p.y, p.z]),
        "annotated": out_path,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
