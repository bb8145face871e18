//! Static, filterable HTML page of specialists.

use std::fmt::Write as _;

use harvest_core::ProjectedSpecialist;

const FILTER_COLUMNS: usize = 3;

/// UI strings for one page language.
struct PageText {
    lang: &'static str,
    title: &'static str,
    choose_services: &'static str,
    services: &'static str,
    no_services: &'static str,
}

impl PageText {
    fn for_language(language: &str) -> Self {
        match language {
            "fi" => Self {
                lang: "fi",
                title: "Asiantuntijahaku",
                choose_services: "Valitse palvelut",
                services: "Palvelut:",
                no_services: "Ei palveluita saatavilla suodatukseen.",
            },
            "sv" => Self {
                lang: "sv",
                title: "Sök specialister",
                choose_services: "Välj tjänster",
                services: "Tjänster:",
                no_services: "Inga tjänster tillgängliga för filtrering.",
            },
            _ => Self {
                lang: "en",
                title: "Specialist search",
                choose_services: "Choose services",
                services: "Services:",
                no_services: "No services available for filtering.",
            },
        }
    }
}

const STYLE: &str = r#"
  body { font-family: Arial, sans-serif; margin: 20px; background-color: #f9f9f9; }
  h1 { text-align: center; }
  .warning { color: red; text-align: center; }
  .service-columns { display: flex; justify-content: space-between; }
  .service-column { flex: 1; margin: 0 10px; }
  .specialist { background-color: #fff; padding: 15px; margin: 15px 0; border-radius: 5px; box-shadow: 0 2px 5px rgba(0,0,0,0.1); }
  .specialist-info { display: flex; }
  .specialist img { max-width: 150px; margin-right: 15px; border-radius: 5px; }
  .specialist-details h3 { margin-top: 0; }
  .specialist-details p { margin: 5px 0; }
  #service-filters { margin-bottom: 20px; }
  label { display: block; margin-bottom: 5px; }
"#;

// A specialist stays visible only if it offers every checked service.
const SCRIPT: &str = r#"
  function filterSpecialists() {
    const selected = Array.from(document.querySelectorAll('input[name="service"]:checked')).map(cb => cb.value);
    document.querySelectorAll('.specialist').forEach(spec => {
      const services = JSON.parse(spec.getAttribute('data-services'));
      const match = selected.length === 0 || selected.every(s => services.includes(s));
      spec.style.display = match ? '' : 'none';
    });
  }
"#;

/// Render the full page. `labels` are the checkbox filters, already sorted.
pub fn render_page(specialists: &[ProjectedSpecialist], labels: &[String], language: &str) -> String {
    let text = PageText::for_language(language);
    let mut html = String::new();

    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(html, "<html lang=\"{}\">", text.lang);
    let _ = writeln!(html, "<head>");
    let _ = writeln!(html, "<meta charset=\"UTF-8\">");
    let _ = writeln!(html, "<title>{}</title>", text.title);
    let _ = writeln!(html, "<style>{}</style>", STYLE);
    let _ = writeln!(html, "</head>");
    let _ = writeln!(html, "<body>");
    let _ = writeln!(html, "<h1>{}</h1>", text.title);

    if labels.is_empty() {
        tracing::warn!("No services left after filtering, page will have no filters");
        let _ = writeln!(html, "<p class=\"warning\">{}</p>", text.no_services);
    } else {
        let _ = writeln!(html, "<div id=\"service-filters\">");
        let _ = writeln!(html, "<h2>{}</h2>", text.choose_services);
        render_filters(&mut html, labels);
        let _ = writeln!(html, "</div>");
        let _ = writeln!(html, "<hr>");
    }

    let _ = writeln!(html, "<div id=\"specialists-list\">");
    for specialist in specialists {
        render_specialist(&mut html, specialist, &text);
    }
    let _ = writeln!(html, "</div>");

    if !labels.is_empty() {
        let _ = writeln!(html, "<script>{}</script>", SCRIPT);
    }
    let _ = writeln!(html, "</body>");
    let _ = writeln!(html, "</html>");
    html
}

fn render_filters(html: &mut String, labels: &[String]) {
    let per_column = labels.len().div_ceil(FILTER_COLUMNS).max(1);
    let _ = writeln!(html, "<div class=\"service-columns\">");
    for column in labels.chunks(per_column) {
        let _ = writeln!(html, "<div class=\"service-column\">");
        for label in column {
            let label = escape(label);
            let _ = writeln!(
                html,
                "<label><input type=\"checkbox\" name=\"service\" value=\"{}\" onchange=\"filterSpecialists()\"> {}</label>",
                label, label
            );
        }
        let _ = writeln!(html, "</div>");
    }
    let _ = writeln!(html, "</div>");
}

fn render_specialist(html: &mut String, s: &ProjectedSpecialist, text: &PageText) {
    // Services travel as a JSON array so labels may contain any character.
    let services_json = serde_json::to_string(&s.services).unwrap_or_else(|_| "[]".to_string());
    let name = escape(&s.full_name());

    let _ = writeln!(
        html,
        "<div class=\"specialist\" data-id=\"{}\" data-services=\"{}\">",
        escape(&s.id),
        escape(&services_json)
    );
    let _ = writeln!(html, "<div class=\"specialist-info\">");
    if let Some(uri) = &s.image_uri {
        let _ = writeln!(html, "<img src=\"{}\" alt=\"{}\">", escape(uri), name);
    }
    let _ = writeln!(html, "<div class=\"specialist-details\">");
    let _ = writeln!(html, "<h3>{}</h3>", name);
    let _ = writeln!(html, "<p><strong>{}</strong></p>", escape(&s.title));
    let _ = writeln!(html, "<p>{}</p>", escape(&s.short_description));
    let _ = writeln!(html, "<p>{}</p>", escape(&s.presentation));
    let _ = writeln!(html, "</div>");
    let _ = writeln!(html, "</div>");
    let _ = writeln!(
        html,
        "<p><strong>{}</strong> {}</p>",
        text.services,
        escape(&s.services.join(", "))
    );
    let _ = writeln!(html, "</div>");
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specialist(id: &str, services: &[&str]) -> ProjectedSpecialist {
        ProjectedSpecialist {
            id: id.into(),
            first_name: "Anna".into(),
            last_name: "Aalto".into(),
            image_uri: Some("https://img.test/a.jpg".into()),
            title: "Yleislääkäri".into(),
            short_description: "<b>bold</b>".into(),
            presentation: String::new(),
            services: services.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn renders_every_specialist_and_filter() {
        let page = render_page(
            &[specialist("a", &["Laboratorio"]), specialist("b", &["Röntgen"])],
            &labels(&["Laboratorio", "Röntgen"]),
            "fi",
        );
        assert!(page.contains("<html lang=\"fi\">"));
        assert!(page.contains("Valitse palvelut"));
        assert_eq!(page.matches("class=\"specialist\"").count(), 2);
        assert_eq!(page.matches("type=\"checkbox\"").count(), 2);
        assert!(page.contains("value=\"Laboratorio\""));
        assert!(page.contains("function filterSpecialists()"));
    }

    #[test]
    fn filters_are_split_into_three_columns() {
        let page = render_page(&[], &labels(&["a", "b", "c", "d", "e", "f", "g"]), "en");
        assert_eq!(page.matches("class=\"service-column\"").count(), 3);
    }

    #[test]
    fn no_labels_shows_warning_instead_of_filters() {
        let page = render_page(&[specialist("a", &[])], &[], "fi");
        assert!(page.contains("Ei palveluita saatavilla suodatukseen."));
        assert!(!page.contains("type=\"checkbox\""));
        assert!(page.contains("class=\"specialist\""));
    }

    #[test]
    fn text_is_escaped() {
        let page = render_page(&[specialist("a", &["A & B"])], &labels(&["A & B"]), "fi");
        assert!(page.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(page.contains("value=\"A &amp; B\""));
        assert!(page.contains("data-services=\"[&quot;A &amp; B&quot;]\""));
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        let page = render_page(&[], &labels(&["x"]), "de");
        assert!(page.contains("<html lang=\"en\">"));
        assert!(page.contains("Choose services"));
    }
}
