use image::{Rgb, RgbImage};

fn fill(img: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32, color: Rgb<u8>) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            img.put_pixel(x, y, color);
        }
    }
}

fn main() {
    let mut img = RgbImage::new(800, 600);

    // Gray gravel with a faint gradient
    for y in 0..600 {
        for x in 0..800 {
            let v = 100 + (x * 40 / 800) as u8;
            img.put_pixel(x, y, Rgb([v, v, (y * 30 / 600) as u8 + 95]));
        }
    }

    let red = Rgb([200, 35, 30]);
    // 1 m marker, 120 px on a side
    fill(&mut img, 40, 40, 120, 120, red);
    // pipes: 36 px (300 mm), 60 px (500 mm), 110 px (~917 mm)
    fill(&mut img, 240, 60, 36, 480, red);
    fill(&mut img, 360, 80, 60, 420, red);
    fill(&mut img, 520, 50, 110, 500, red);

    img.save("synthetic_scene.png").unwrap();
    println!("Created synthetic_scene.png (800x600, marker 120 px = 1 m)");
    println!("Try: pipemeasure synthetic_scene.png --marker-length 1.0 --annotate-out annotated.png");
}
