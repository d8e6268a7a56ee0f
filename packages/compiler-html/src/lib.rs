mod compiler;

#[cfg(test)]
mod tests;

pub use compiler::{escape_html, render_error_html, render_to_html, RenderOptions};
