//! HTML and RSS rendering.
//!
//! Templates are mustache (ramhorns) sources compiled into the binary. Each
//! page renders its own body, which is then wrapped in `base.html`.

pub mod pages;
pub mod rss;

use ramhorns::{Content, Template};

use crate::middleware::auth::Identity;

/// Page templates, compiled once at startup.
pub struct Templates {
    base: Template<'static>,
    pub index: Template<'static>,
    pub list: Template<'static>,
    pub detail: Template<'static>,
    pub share: Template<'static>,
    pub comment: Template<'static>,
    pub search: Template<'static>,
    pub delete_comment: Template<'static>,
    pub register: Template<'static>,
    pub login: Template<'static>,
    pub confirm_logout: Template<'static>,
    pub logged_out: Template<'static>,
}

#[derive(Content)]
struct Layout<'a> {
    title: &'a str,
    user: Option<LayoutUser<'a>>,
    content: String,
}

#[derive(Content)]
struct LayoutUser<'a> {
    username: &'a str,
}

impl Templates {
    pub fn new() -> Result<Self, ramhorns::Error> {
        Ok(Self {
            base: Template::new(include_str!("../../templates/base.html"))?,
            index: Template::new(include_str!("../../templates/index.html"))?,
            list: Template::new(include_str!("../../templates/list.html"))?,
            detail: Template::new(include_str!("../../templates/detail.html"))?,
            share: Template::new(include_str!("../../templates/share.html"))?,
            comment: Template::new(include_str!("../../templates/comment.html"))?,
            search: Template::new(include_str!("../../templates/search.html"))?,
            delete_comment: Template::new(include_str!("../../templates/delete_comment.html"))?,
            register: Template::new(include_str!("../../templates/register.html"))?,
            login: Template::new(include_str!("../../templates/login.html"))?,
            confirm_logout: Template::new(include_str!("../../templates/confirm_logout.html"))?,
            logged_out: Template::new(include_str!("../../templates/logged_out.html"))?,
        })
    }

    /// Render `page` with `content` and wrap it in the site layout.
    pub fn render<C: Content>(
        &self,
        page: &Template<'static>,
        title: &str,
        user: Option<&Identity>,
        content: &C,
    ) -> String {
        self.base.render(&Layout {
            title,
            user: user.map(|identity| LayoutUser {
                username: &identity.username,
            }),
            content: page.render(content),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_compile() {
        assert!(Templates::new().is_ok());
    }

    #[test]
    fn test_layout_escapes_title_but_not_body() {
        let templates = Templates::new().unwrap();
        let page = pages::TitledPage { title: "Yablog" };
        let html = templates.render(&templates.index, "<Home>", None, &page);

        assert!(html.contains("<title>&lt;Home&gt;</title>"));
        assert!(html.contains("<h1>Yablog</h1>"));
        assert!(html.contains("/account/login/"));
    }
}
