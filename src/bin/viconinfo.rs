//! Command line inspector for flat vector icons: prints the decoded
//! structure and optionally renders the icon to a PNG.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use vicon::prelude::*;

#[derive(Parser)]
#[command(name = "viconinfo", about = "Inspect and render flat vector icons")]
struct Args {
    /// Icon file ("ficn" flat format or "IMSG" archive).
    file: PathBuf,

    /// Render the icon to this PNG file.
    #[arg(long)]
    render: Option<PathBuf>,

    /// Edge length of the rendered bitmap in pixels.
    #[arg(long, default_value_t = 64)]
    size: u32,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let data = std::fs::read(&args.file)?;
    let icon = decode(&data)?;

    print_summary(&icon, data.len());

    if let Some(output) = &args.render {
        let mut bitmap = Bitmap::new(args.size, args.size)?;
        let options = RenderOptions {
            scale: args.size as f64 / 64.0,
            ..RenderOptions::default()
        };
        render(&icon, &mut bitmap, &options);

        // PNG wants straight-alpha RGBA.
        bitmap.demultiply();
        let mut rgba = Vec::with_capacity(bitmap.pixels().len());
        for pixel in bitmap.pixels().chunks_exact(4) {
            rgba.extend_from_slice(&[pixel[2], pixel[1], pixel[0], pixel[3]]);
        }
        image::save_buffer(output, &rgba, args.size, args.size, image::ColorType::Rgba8)?;
        println!("rendered {}x{} -> {}", args.size, args.size, output.display());
    }

    Ok(())
}

fn print_summary(icon: &Icon, byte_size: usize) {
    let styles = icon.styles().borrow();
    let paths = icon.paths().borrow();
    let shapes = icon.shapes().borrow();

    println!(
        "{} bytes, {} styles, {} paths, {} shapes",
        byte_size,
        styles.count_items(),
        paths.count_items(),
        shapes.count_items()
    );

    for (i, style) in styles.iter().enumerate() {
        let style = style.borrow();
        match style.gradient() {
            Some(gradient) => println!(
                "  style {i}: {:?} gradient, {} stops{}",
                gradient.gradient_type(),
                gradient.count_stops(),
                if gradient.transform().is_identity() { "" } else { ", transformed" }
            ),
            None => println!("  style {i}: solid {}", style.color()),
        }
    }

    for (i, path) in paths.iter().enumerate() {
        let path = path.borrow();
        println!(
            "  path {i}: {} points{}",
            path.count_points(),
            if path.is_closed() { ", closed" } else { "" }
        );
    }

    for (i, shape) in shapes.iter().enumerate() {
        let shape = shape.borrow();
        let transformers: Vec<&str> = shape.transformers().iter().map(|t| t.name()).collect();
        println!(
            "  shape {i}: {} paths, transform {}, transformers [{}]",
            shape.paths().borrow().count_items(),
            if shape.transform().is_identity() { "identity" } else { "set" },
            transformers.join(", ")
        );
    }
}
