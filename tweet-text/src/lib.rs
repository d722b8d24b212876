use lazy_static::lazy_static;
use pulldown_cmark::{html, CowStr, Event, LinkType, Tag};
use regex::{Captures, Regex};

/// What to put where an in-text token used to be.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Replacement {
    Strip,
    Link { href: String, text: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Link { href: String, text: String },
}

/// Split tweet text into plain and linked segments.
///
/// Every occurrence of each token is replaced, in the order the tokens are
/// given. Tokens are only searched for in plain text, never inside a link
/// produced by an earlier token.
pub fn resolve<'a>(
    text: &str,
    tokens: impl IntoIterator<Item = (&'a str, Replacement)>,
) -> Vec<Segment> {
    let mut segments = vec![Segment::Text(decode_entities(text))];

    for (token, replacement) in tokens {
        if token.is_empty() {
            continue;
        }
        segments = segments
            .into_iter()
            .flat_map(|segment| match segment {
                Segment::Text(text) if text.contains(token) => {
                    split_on(&text, token, &replacement)
                }
                other => vec![other],
            })
            .collect();
    }

    tidy(segments)
}

fn split_on(text: &str, token: &str, replacement: &Replacement) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    for (position, piece) in text.split(token).enumerate() {
        if position > 0 {
            if let Replacement::Link { href, text } = replacement {
                segments.push(Segment::Link {
                    href: href.clone(),
                    text: text.clone(),
                });
            }
        }
        segments.push(Segment::Text(piece.to_string()));
    }
    segments
}

// merge neighbouring text, drop empty text, trim the outer edges
fn tidy(segments: Vec<Segment>) -> Vec<Segment> {
    let mut tidied: Vec<Segment> = Vec::new();
    for segment in segments {
        if let (Some(Segment::Text(previous)), Segment::Text(text)) = (tidied.last_mut(), &segment) {
            previous.push_str(text);
            continue;
        }
        tidied.push(segment);
    }

    if let Some(Segment::Text(text)) = tidied.first_mut() {
        *text = text.trim_start().to_string();
    }
    if let Some(Segment::Text(text)) = tidied.last_mut() {
        *text = text.trim_end().to_string();
    }
    tidied.retain(|segment| !matches!(segment, Segment::Text(text) if text.is_empty()));
    tidied
}

/// Twitter stores `full_text` with `&`, `<` and `>` entity-escaped.
pub fn decode_entities(text: &str) -> String {
    entity_regex()
        .replace_all(text, |caps: &Captures| {
            match &caps[1] {
                "amp" => "&",
                "lt" => "<",
                "gt" => ">",
                "quot" => "\"",
                _ => "'",
            }
            .to_string()
        })
        .into_owned()
}

pub fn entity_regex() -> &'static Regex {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"&(amp|lt|gt|quot|#39|apos);").unwrap();
    }
    &RE
}

/// A paragraph of events, with line breaks kept as hard breaks.
pub fn events(segments: &[Segment]) -> impl Iterator<Item = Event<'_>> {
    let body = segments.iter().flat_map(|segment| match segment {
        Segment::Text(text) => text_events(text),
        Segment::Link { href, text } => {
            let link_tag = Tag::Link(LinkType::Inline, CowStr::from(href.as_str()), "".into());
            vec![
                Event::Start(link_tag.clone()),
                Event::Text(CowStr::from(text.as_str())),
                Event::End(link_tag),
            ]
        }
    });

    std::iter::once(Event::Start(Tag::Paragraph))
        .chain(body)
        .chain(std::iter::once(Event::End(Tag::Paragraph)))
}

fn text_events(text: &str) -> Vec<Event<'_>> {
    let mut events: Vec<Event> = Vec::new();
    for (position, line) in text.split('\n').enumerate() {
        if position > 0 {
            events.push(Event::HardBreak);
        }
        if !line.is_empty() {
            events.push(Event::Text(CowStr::from(line)));
        }
    }
    events
}

pub fn to_html(segments: &[Segment]) -> String {
    let mut html_buf = String::new();
    html::push_html(&mut html_buf, events(segments));
    html_buf
}
