//! TEI response parsing.
//!
//! Builds a small element tree with quick-xml and reads title, header
//! authors, abstract and body sections from it. Namespace prefixes are
//! ignored; elements are matched by local name.

use paperlens_core::{Document, Error, ExtractionMethod, Result, SectionMap, UNKNOWN_TITLE};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::info;

#[derive(Debug, Default)]
struct Element {
    name: String,
    children: Vec<Node>,
}

#[derive(Debug)]
enum Node {
    Element(Element),
    Text(String),
}

impl Element {
    fn named(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
        }
    }

    fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    fn path(&self, names: &[&str]) -> Option<&Element> {
        names.iter().try_fold(self, |el, name| el.child(name))
    }

    /// Every descendant with this name, in document order.
    fn descendants<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        for child in self.elements() {
            if child.name == name {
                out.push(child);
            }
            child.descendants(name, out);
        }
    }

    fn find_all(&self, name: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        self.descendants(name, &mut out);
        out
    }

    fn collect_text(&self, buf: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(t) => buf.push_str(t),
                Node::Element(e) => {
                    buf.push(' ');
                    e.collect_text(buf);
                    buf.push(' ');
                }
            }
        }
    }

    /// Whitespace-normalised text of the whole subtree.
    fn text(&self) -> String {
        let mut buf = String::new();
        self.collect_text(&mut buf);
        buf.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

fn local_name(raw: &[u8]) -> String {
    let local = match raw.iter().rposition(|b| *b == b':') {
        Some(i) => &raw[i + 1..],
        None => raw,
    };
    String::from_utf8_lossy(local).into_owned()
}

fn malformed(msg: impl std::fmt::Display) -> Error {
    Error::MalformedResponse(format!("Invalid TEI XML: {}", msg))
}

fn build_tree(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![Element::default()];

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(e) => stack.push(Element::named(local_name(e.name().as_ref()))),
            Event::Empty(e) => {
                let el = Element::named(local_name(e.name().as_ref()));
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Element(el));
                }
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(malformed("unbalanced end tag"));
                }
                if let Some(done) = stack.pop() {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Element(done));
                    }
                }
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(malformed)?;
                if let Some(current) = stack.last_mut() {
                    current.children.push(Node::Text(text.into_owned()));
                }
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                if let Some(current) = stack.last_mut() {
                    current.children.push(Node::Text(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(malformed("unclosed elements at end of input"));
    }
    let document = stack.pop().unwrap_or_default();
    document
        .children
        .into_iter()
        .find_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
        .ok_or_else(|| malformed("no root element"))
}

fn author_name(author: &Element) -> Option<String> {
    let surname = author
        .find_all("surname")
        .first()
        .map(|s| s.text())
        .filter(|s| !s.is_empty())?;
    let forenames: Vec<String> = author
        .find_all("forename")
        .iter()
        .map(|f| f.text())
        .filter(|f| !f.is_empty())
        .collect();
    if forenames.is_empty() {
        Some(surname)
    } else {
        Some(format!("{} {}", forenames.join(" "), surname))
    }
}

fn paragraphs_text(el: &Element) -> String {
    el.find_all("p")
        .iter()
        .map(|p| p.text())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a TEI document into a structured [`Document`].
pub fn parse_tei(xml: &str, id: &str) -> Result<Document> {
    let root = build_tree(xml)?;
    if root.name != "TEI" {
        return Err(malformed(format!("unexpected root <{}>", root.name)));
    }

    let title = root
        .path(&["teiHeader", "fileDesc", "titleStmt", "title"])
        .map(Element::text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

    let authors: Vec<String> = root
        .path(&["teiHeader", "fileDesc", "sourceDesc"])
        .map(|source| {
            source
                .find_all("author")
                .into_iter()
                .filter_map(author_name)
                .collect()
        })
        .unwrap_or_default();

    let abstract_text = root
        .find_all("abstract")
        .first()
        .map(|a| paragraphs_text(a))
        .unwrap_or_default();

    let mut sections = SectionMap::new();
    if let Some(body) = root.find_all("body").first() {
        for div in body.find_all("div") {
            let Some(head) = div.child("head") else {
                continue;
            };
            let heading = head.text();
            if heading.is_empty() {
                continue;
            }
            Document::push_section(&mut sections, &heading, &paragraphs_text(div));
        }
    }

    info!(
        "Parsed TEI for {}: {} sections, {} authors",
        id,
        sections.len(),
        authors.len()
    );

    let mut doc = Document::new(
        id,
        title,
        authors,
        abstract_text,
        sections,
        ExtractionMethod::Structured,
    );
    doc.details.xml_size = Some(xml.len());
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <teiHeader>
    <fileDesc>
      <titleStmt>
        <title level="a" type="main">Attention Is All You Need</title>
      </titleStmt>
      <sourceDesc>
        <biblStruct>
          <analytic>
            <author><persName><forename type="first">Ashish</forename><surname>Vaswani</surname></persName></author>
            <author><persName><forename type="first">Noam</forename><forename type="middle">M</forename><surname>Shazeer</surname></persName></author>
            <author><orgName>Google Brain</orgName></author>
          </analytic>
        </biblStruct>
      </sourceDesc>
    </fileDesc>
    <profileDesc>
      <abstract>
        <div><p>The dominant sequence models are recurrent.</p><p>We propose the Transformer.</p></div>
      </abstract>
    </profileDesc>
  </teiHeader>
  <text>
    <body>
      <div><head n="1">Introduction</head><p>Recurrent networks <ref type="bibr">[1]</ref> are standard.</p></div>
      <div><head>Model &amp; Training</head><p>Stacked attention.</p><p>Trained on GPUs.</p></div>
      <div><p>A div without a heading.</p></div>
      <div><head>Introduction</head><p>More motivation.</p></div>
      <div><head>Empty</head></div>
    </body>
    <back>
      <listBibl>
        <biblStruct><analytic><author><persName><forename>Kyunghyun</forename><surname>Cho</surname></persName></author></analytic></biblStruct>
      </listBibl>
    </back>
  </text>
</TEI>"#;

    #[test]
    fn test_parse_full_sample() {
        let doc = parse_tei(SAMPLE, "1706.03762").unwrap();
        assert_eq!(doc.id, "1706.03762");
        assert_eq!(doc.title, "Attention Is All You Need");
        assert_eq!(doc.authors, vec!["Ashish Vaswani", "Noam M Shazeer"]);
        assert_eq!(
            doc.abstract_text,
            "The dominant sequence models are recurrent. We propose the Transformer."
        );
        assert_eq!(doc.method, ExtractionMethod::Structured);
        assert_eq!(doc.details.xml_size, Some(SAMPLE.len()));
    }

    #[test]
    fn test_sections_merge_duplicates_and_skip_unheaded() {
        let doc = parse_tei(SAMPLE, "x").unwrap();
        let keys: Vec<&str> = doc.sections.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Introduction", "Model & Training"]);
        assert_eq!(
            doc.sections["Introduction"],
            "Recurrent networks [1] are standard. More motivation."
        );
        assert_eq!(
            doc.sections["Model & Training"],
            "Stacked attention. Trained on GPUs."
        );
    }

    #[test]
    fn test_missing_title_defaults() {
        let doc = parse_tei("<TEI><teiHeader/><text><body/></text></TEI>", "x").unwrap();
        assert_eq!(doc.title, UNKNOWN_TITLE);
        assert!(doc.sections.is_empty());
        assert!(doc.authors.is_empty());
    }

    #[test]
    fn test_wrong_root_is_malformed() {
        let err = parse_tei("<html><body/></html>", "x").unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            parse_tei("not xml at all", "x"),
            Err(Error::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_tei("<TEI><teiHeader></TEI>", "x"),
            Err(Error::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_tei("<TEI><text>", "x"),
            Err(Error::MalformedResponse(_))
        ));
    }
}
