//! Render a built-in family to a PNG: `render_fractal [FAMILY] [OUT] [PX_PER_UNIT]`.

use std::{env, path::PathBuf};

use fractal_markers::{render_family, MarkerFamily, MarkerModelSet};
use log::LevelFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    fractal_markers_core::init_with_level(LevelFilter::Info)?;

    let mut args = env::args().skip(1);
    let family: MarkerFamily = args
        .next()
        .unwrap_or_else(|| "FRACTAL_2L_6".to_string())
        .parse()?;
    let out = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("testdata/fractal_2l_6.png"));
    let px_per_unit: f32 = match args.next() {
        Some(v) => v.parse()?,
        None => 200.0,
    };

    let set = MarkerModelSet::from_family(family)?;
    let (img, _) = render_family(&set, px_per_unit, 40);
    let luma = image::GrayImage::from_raw(img.width as u32, img.height as u32, img.data)
        .ok_or("rendered buffer does not match its dimensions")?;
    luma.save(&out)?;
    println!("wrote {} ({}x{})", out.display(), luma.width(), luma.height());
    Ok(())
}
