use std::{cell::RefCell, rc::Rc};

use lol_html::{RewriteStrSettings, element, rewrite_str};

use crate::application::render::types::RenderError;

use super::hooks::{LinkAttributes, RenderHooks};

const SOURCEPOS: &str = "data-sourcepos";
const HEADINGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Apply heading anchors and the link hook to rendered HTML, then drop the
/// source position markers.
///
/// Only headings produced from markdown carry `data-sourcepos`, so raw HTML
/// headings never consume an anchor.
pub(crate) fn finish_html(
    html: &str,
    anchors: &[Option<String>],
    hooks: &RenderHooks,
) -> Result<String, RenderError> {
    let next_heading = Rc::new(RefCell::new(0usize));
    let link_hook = hooks.link;

    let mut handlers = Vec::with_capacity(HEADINGS.len() + 2);
    for tag in HEADINGS {
        let next_heading = Rc::clone(&next_heading);
        handlers.push(element!(format!("{tag}[{SOURCEPOS}]"), move |el| {
            let index = {
                let mut next = next_heading.borrow_mut();
                let index = *next;
                *next += 1;
                index
            };
            if let Some(Some(anchor)) = anchors.get(index)
                && el.get_attribute("id").is_none()
            {
                el.set_attribute("id", anchor)?;
            }
            Ok(())
        }));
    }

    handlers.push(element!("a[href]", move |el| {
        let original = LinkAttributes {
            href: el.get_attribute("href").unwrap_or_default(),
            title: el.get_attribute("title"),
            target: el.get_attribute("target"),
            rel: el.get_attribute("rel"),
        };
        let mut link = original.clone();
        link_hook(&mut link);

        if link == original {
            return Ok(());
        }
        el.set_attribute("href", &link.href)?;
        for (name, before, after) in [
            ("title", &original.title, &link.title),
            ("target", &original.target, &link.target),
            ("rel", &original.rel, &link.rel),
        ] {
            if before == after {
                continue;
            }
            match after {
                Some(value) => el.set_attribute(name, value)?,
                None => el.remove_attribute(name),
            }
        }
        Ok(())
    }));

    handlers.push(element!(format!("[{SOURCEPOS}]"), |el| {
        el.remove_attribute(SOURCEPOS);
        Ok(())
    }));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: handlers,
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::Document {
        message: err.to_string(),
    })
}
