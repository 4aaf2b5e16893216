use katex::{Opts, OptsBuilder, OutputType};

use crate::application::render::types::RenderError;

use super::hooks::MathStyle;

/// Typeset one `$…$` or `$$…$$` expression as KaTeX HTML.
///
/// Macros and `\href`-style commands are not trusted, and malformed input is
/// an error rather than KaTeX's red inline error box.
pub(crate) fn render_math_html(literal: &str, style: MathStyle) -> Result<String, RenderError> {
    let expression = literal.trim();
    if expression.is_empty() {
        return Err(RenderError::Math {
            message: "empty expression".to_string(),
        });
    }

    katex::render_with_opts(expression, katex_opts(style)?).map_err(|err| RenderError::Math {
        message: format!("KaTeX rejected `{expression}`: {err}"),
    })
}

fn katex_opts(style: MathStyle) -> Result<Opts, RenderError> {
    let mut builder = OptsBuilder::default();
    builder.display_mode(style == MathStyle::Display);
    builder.output_type(OutputType::Html);
    builder.throw_on_error(true);
    builder.trust(false);

    builder.build().map_err(|err| RenderError::Math {
        message: format!("failed to build KaTeX options: {err}"),
    })
}
