use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use isopod_gltf::{CancelToken, DiagnosticLog, ExtensionRegistry, ImportOptions, Importer};

/// Imports a glTF file and prints what it contains
#[derive(Parser)]
#[command(name = "gltf-inspect")]
#[command(about = "Import a .gltf or .glb file and print a summary plus diagnostics")]
struct Cli {
	/// The .gltf or .glb file to read
	file: PathBuf,

	/// RON file with import options
	#[arg(long)]
	config: Option<PathBuf>,

	/// Skip document validation
	#[arg(long)]
	no_validate: bool,
}

fn main() -> Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let cli = Cli::parse();

	let mut options = match &cli.config {
		Some(path) => {
			let text = std::fs::read_to_string(path)
				.with_context(|| format!("failed to read {}", path.display()))?;
			ImportOptions::from_ron(&text)
				.with_context(|| format!("invalid import options in {}", path.display()))?
		},
		None => ImportOptions::default(),
	};
	if cli.no_validate {
		options.validate = false;
	}

	let registry = ExtensionRegistry::khronos();
	let mut log = DiagnosticLog::new();
	let result = Importer::new(&registry)
		.with_options(options)
		.import_file(&cli.file, &mut log, &CancelToken::new());

	match &result {
		Ok(import) => {
			let doc = &import.document;
			println!("{}", cli.file.display());
			println!("  version    {}", doc.asset.version);
			if let Some(generator) = &doc.asset.generator {
				println!("  generator  {generator}");
			}
			println!("  scenes     {}", doc.scenes.len());
			println!("  nodes      {}", doc.nodes.len());
			println!("  meshes     {}", doc.meshes.len());
			println!("  materials  {}", doc.materials.len());
			println!("  textures   {}", doc.textures.len());
			println!("  images     {}", doc.images.len());
			println!("  accessors  {}", doc.accessors.len());
			println!("  buffers    {}", doc.buffers.len());
			println!("  animations {}", doc.animations.len());
			println!("  skins      {}", doc.skins.len());
			if !doc.extensions_used.is_empty() {
				println!("  extensions {}", doc.extensions_used.join(", "));
			}
			for (m, mesh) in import.meshes.iter().enumerate() {
				println!("mesh {m} {}", mesh.name.as_deref().unwrap_or(""));
				for (p, primitive) in mesh.primitives.iter().enumerate() {
					match primitive {
						Ok(data) => println!(
							"  primitive {p}: {} vertices, {} indices, {} uv sets, {} targets",
							data.n_vertices,
							data.indices.as_ref().map_or(0, Vec::len),
							data.tex_coords.len(),
							data.targets.len(),
						),
						Err(e) => println!("  primitive {p}: {e}"),
					}
				}
			}
		},
		Err(e) => println!("import of {} failed: {e}", cli.file.display()),
	}

	if !log.is_empty() {
		println!("{} diagnostics", log.len());
		for diagnostic in log.iter() {
			println!("  {diagnostic}");
		}
	}

	if result.is_err() || log.has_errors() {
		std::process::exit(1);
	}
	Ok(())
}
