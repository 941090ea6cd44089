use fbxbin::io::{write_file, WriteOptions};
use fbxbin::structs::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let version = 7400;

    let mut root = Element::root();
    root.add_child(Element::new("FBXHeaderExtension")?)
        .add_child(Element::new("FBXVersion")?)
        .add_int32(version as i32);

    let hello_world = [
        "#  #      # #          #     #           #    #",
        "#  #  ##  # #  ##      #     #  ##  # ## #  ###",
        "#### #### # # #  #     #  #  # #  # ##   # #  #",
        "#  # #    # # #  #      # # #  #  # #    # #  #",
        "#  #  ### # #  ##        # #    ##  #    #  ## ",
    ];

    let objects = root.add_child(Element::new("Objects")?);
    let mut uid = 1000i64;
    for (y, line) in hello_world.iter().enumerate() {
        for (x, c) in line.bytes().enumerate() {
            if c != b'#' {
                continue;
            }
            let model = objects.add_child(Element::new("Model")?);
            model.add_int64(uid);
            model.add_string_unicode(&format!("Block{uid}\x00\x01Model"))?;
            model.add_string_unicode("Mesh")?;
            model
                .add_child(Element::new("Lcl Translation")?)
                .add_float64_array(&[x as f64, -(y as f64), 0.0])?;
            uid += 1;
        }
    }

    root.add_child(Element::new("Connections")?);

    let bytes = write_file("example_scene.fbx", &root, version, &WriteOptions::default())?;
    println!("Written: example_scene.fbx ({bytes} bytes)");
    Ok(())
}
