use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Name of the example document
    #[arg(short, long, default_value = "guide.mdx")]
    pub example: String,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

const EXAMPLE_DOCUMENT: &str = r#"export const product = "Livemark"

# Welcome to {product}

<Callout type="tip" title="Live preview">
Run `livemark watch` on this file and edit it.
</Callout>

## Next steps

<Steps>
<Step title="Write">
Add prose, components and expressions like {2 * 21}.
</Step>
<Step title="Preview">
Watch the HTML update as you type.
</Step>
</Steps>
"#;

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = Config::path(cwd);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Livemark project...".bright_blue().bold());

    // Create example document
    let example_file = cwd.join(&args.example);
    if !example_file.exists() {
        fs::write(&example_file, EXAMPLE_DOCUMENT)?;
        println!("  {} Created {}", "✓".green(), args.example);
    }

    // Write config file
    let config_json = serde_json::to_string_pretty(&Config::default())?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Edit {}", args.example);
    println!("  2. Run: livemark watch {} --out preview.html", args.example);
    println!("  3. Open preview.html in a browser");

    Ok(())
}
