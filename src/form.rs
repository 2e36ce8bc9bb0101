use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

static FORM_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("form").expect("selector parses"));
static FIELD_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("input[name], textarea[name], select[name]").expect("selector parses")
});
static OPTION_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("option").expect("selector parses"));

/// The submittable state of an HTML `<form>`: where it posts and the
/// name/value pairs a browser would send without user interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlForm {
    pub action: Url,
    pub method: String,
    pub fields: Vec<(String, String)>,
}

impl HtmlForm {
    /// First form of the page, with its action resolved against `page_url`.
    pub fn first_in(html: &str, page_url: &Url) -> Option<Self> {
        let document = Html::parse_document(html);
        let form = document.select(&FORM_SEL).next()?;

        let action = form
            .value()
            .attr("action")
            .filter(|action| !action.trim().is_empty())
            .and_then(|action| page_url.join(action.trim()).ok())
            .unwrap_or_else(|| page_url.clone());
        let method = form
            .value()
            .attr("method")
            .unwrap_or("get")
            .to_ascii_lowercase();

        let fields = form.select(&FIELD_SEL).filter_map(field_value).collect();

        Some(Self {
            action,
            method,
            fields,
        })
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|(key, _)| key == name)
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Overwrites the first field called `name`, appending it when absent.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.fields.iter_mut().find(|(key, _)| key == name) {
            Some((_, current)) => *current = value.to_string(),
            None => self.fields.push((name.to_string(), value.to_string())),
        }
    }

    pub fn is_post(&self) -> bool {
        self.method == "post"
    }
}

fn field_value(element: ElementRef<'_>) -> Option<(String, String)> {
    let attrs = element.value();
    let name = attrs.attr("name")?.to_string();

    let value = match attrs.name() {
        "textarea" => element.text().collect::<String>(),
        "select" => {
            let chosen = element
                .select(&OPTION_SEL)
                .find(|opt| opt.value().attr("selected").is_some())
                .or_else(|| element.select(&OPTION_SEL).next())?;
            chosen
                .value()
                .attr("value")
                .map(str::to_string)
                .unwrap_or_else(|| chosen.text().collect::<String>().trim().to_string())
        }
        _ => {
            let kind = attrs.attr("type").unwrap_or("text").to_ascii_lowercase();
            match kind.as_str() {
                "submit" | "button" | "image" | "reset" | "file" => return None,
                "checkbox" | "radio" if attrs.attr("checked").is_none() => return None,
                "checkbox" | "radio" => attrs.attr("value").unwrap_or("on").to_string(),
                _ => attrs.attr("value").unwrap_or_default().to_string(),
            }
        }
    };

    Some((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://example.com/lessons/12345").unwrap()
    }

    #[test]
    fn test_first_form_fields() {
        let html = r#"
        <html><body>
        <form action="/lessons/12345/registrations" method="POST">
            <input type="hidden" name="authenticity_token" value="tok==">
            <input type="text" name="note">
            <input type="checkbox" name="guest" value="1">
            <input type="checkbox" name="rules" value="yes" checked>
            <select name="level"><option value="a">A</option><option value="b" selected>B</option></select>
            <textarea name="comment">hello</textarea>
            <input type="submit" name="commit" value="Réserver">
        </form>
        <form action="/other"><input name="ignored" value="x"></form>
        </body></html>
        "#;
        let form = HtmlForm::first_in(html, &page_url()).unwrap();
        assert_eq!(form.action.as_str(), "https://example.com/lessons/12345/registrations");
        assert!(form.is_post());
        assert_eq!(
            form.fields,
            vec![
                ("authenticity_token".to_string(), "tok==".to_string()),
                ("note".to_string(), String::new()),
                ("rules".to_string(), "yes".to_string()),
                ("level".to_string(), "b".to_string()),
                ("comment".to_string(), "hello".to_string()),
            ]
        );
        assert!(!form.has_field("ignored"));
        assert!(!form.has_field("commit"));
    }

    #[test]
    fn test_form_defaults_to_page_url_and_get() {
        let html = r#"<form><input name="q" value="boxe"></form>"#;
        let form = HtmlForm::first_in(html, &page_url()).unwrap();
        assert_eq!(form.action, page_url());
        assert!(!form.is_post());
        assert_eq!(form.field("q"), Some("boxe"));
    }

    #[test]
    fn test_set_overwrites_or_appends() {
        let html = r#"<form method="post"><input name="session[email]" value=""></form>"#;
        let mut form = HtmlForm::first_in(html, &page_url()).unwrap();
        form.set("session[email]", "me@example.com");
        form.set("session[password]", "secret");
        assert_eq!(form.field("session[email]"), Some("me@example.com"));
        assert_eq!(form.field("session[password]"), Some("secret"));
        assert_eq!(form.fields.len(), 2);
    }

    #[test]
    fn test_no_form() {
        assert!(HtmlForm::first_in("<p>nothing</p>", &page_url()).is_none());
    }
}
