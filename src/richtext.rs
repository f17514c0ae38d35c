//! Renders Prismic rich text into HTML. Consecutive list items are grouped
//! into a single `<ul>` or `<ol>`, and inline spans (`strong`, `em`,
//! `hyperlink`) are applied over the block's text. All text is escaped.

use pulldown_cmark::escape::{escape_href, escape_html, StrWrite};
use std::io;

use crate::document::{BlockKind, ContentSection, RichTextBlock, Span, SpanKind};

/// Renders the sections of an article's `content` group. Each section becomes
/// a `<div>` holding an anchored `<h2>` for its heading (if any) followed by
/// its body.
pub fn render_sections<W: StrWrite>(w: &mut W, sections: &[ContentSection]) -> io::Result<()> {
    for section in sections {
        w.write_str("<div>")?;
        if let Some(heading) = section.heading.as_deref().filter(|h| !h.trim().is_empty()) {
            write!(w, r#"<h2 id="{}">"#, slug::slugify(heading))?;
            escape_html(&mut *w, heading)?;
            w.write_str("</h2>")?;
        }
        render(w, &section.body)?;
        w.write_str("</div>")?;
    }
    Ok(())
}

/// Renders `blocks` as HTML into `w`.
pub fn render<W: StrWrite>(w: &mut W, blocks: &[RichTextBlock]) -> io::Result<()> {
    let mut open_list: Option<&str> = None;
    for block in blocks {
        let list = match block.kind {
            BlockKind::ListItem => Some("ul"),
            BlockKind::OListItem => Some("ol"),
            _ => None,
        };
        if open_list != list {
            if let Some(tag) = open_list {
                write!(w, "</{}>", tag)?;
            }
            if let Some(tag) = list {
                write!(w, "<{}>", tag)?;
            }
            open_list = list;
        }
        render_block(w, block)?;
    }
    if let Some(tag) = open_list {
        write!(w, "</{}>", tag)?;
    }
    Ok(())
}

/// Renders `blocks` into a new [`String`].
pub fn to_html(blocks: &[RichTextBlock]) -> io::Result<String> {
    let mut html = String::new();
    render(&mut html, blocks)?;
    Ok(html)
}

fn render_block<W: StrWrite>(w: &mut W, block: &RichTextBlock) -> io::Result<()> {
    let tag = match block.kind {
        BlockKind::Paragraph => "p",
        BlockKind::Heading1 => "h1",
        BlockKind::Heading2 => "h2",
        BlockKind::Heading3 => "h3",
        BlockKind::Heading4 => "h4",
        BlockKind::Heading5 => "h5",
        BlockKind::Heading6 => "h6",
        BlockKind::Preformatted => "pre",
        BlockKind::ListItem | BlockKind::OListItem => "li",
        BlockKind::Image => return render_image(w, block),
        BlockKind::Unsupported => return Ok(()),
    };
    write!(w, "<{}>", tag)?;
    render_spans(w, block.text.as_deref().unwrap_or_default(), &block.spans)?;
    write!(w, "</{}>", tag)
}

fn render_image<W: StrWrite>(w: &mut W, block: &RichTextBlock) -> io::Result<()> {
    let url = match &block.url {
        Some(url) => url,
        None => return Ok(()),
    };
    w.write_str(r#"<p class="block-img"><img src=""#)?;
    escape_href(&mut *w, url)?;
    w.write_str(r#"" alt=""#)?;
    escape_html(&mut *w, block.alt.as_deref().unwrap_or_default())?;
    w.write_str(r#""></p>"#)
}

/// Writes `text`, wrapping each stretch of it in the tags of the spans that
/// cover it. Tags are reopened at every span boundary so the output is always
/// well nested.
fn render_spans<W: StrWrite>(w: &mut W, text: &str, spans: &[Span]) -> io::Result<()> {
    let offsets = utf16_offsets(text);
    let units = offsets[offsets.len() - 1].0;

    let mut boundaries: Vec<usize> = vec![0, units];
    for span in spans {
        boundaries.push(span.start.min(units));
        boundaries.push(span.end.min(units));
    }
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut covering: Vec<&Span> = Vec::new();
    for window in boundaries.windows(2) {
        let (start, end) = (window[0], window[1]);
        covering.clear();
        covering.extend(
            spans
                .iter()
                .filter(|s| s.start <= start && end <= s.end && s.kind != SpanKind::Unsupported),
        );
        covering.sort_by_key(|s| s.start);

        for span in &covering {
            open_span(w, span)?;
        }
        escape_html(&mut *w, &text[byte_offset(&offsets, start)..byte_offset(&offsets, end)])?;
        for span in covering.iter().rev() {
            close_span(w, span)?;
        }
    }
    Ok(())
}

fn open_span<W: StrWrite>(w: &mut W, span: &Span) -> io::Result<()> {
    match span.kind {
        SpanKind::Strong => w.write_str("<strong>"),
        SpanKind::Em => w.write_str("<em>"),
        SpanKind::Hyperlink => {
            let url = span
                .data
                .as_ref()
                .and_then(|d| d.url.as_deref())
                .unwrap_or_default();
            w.write_str(r#"<a href=""#)?;
            escape_href(&mut *w, url)?;
            w.write_str(r#"">"#)
        }
        SpanKind::Unsupported => Ok(()),
    }
}

fn close_span<W: StrWrite>(w: &mut W, span: &Span) -> io::Result<()> {
    match span.kind {
        SpanKind::Strong => w.write_str("</strong>"),
        SpanKind::Em => w.write_str("</em>"),
        SpanKind::Hyperlink => w.write_str("</a>"),
        SpanKind::Unsupported => Ok(()),
    }
}

/// Maps the UTF-16 offset of every character boundary in `text` to its byte
/// offset, including the end of the string.
fn utf16_offsets(text: &str) -> Vec<(usize, usize)> {
    let mut offsets = Vec::with_capacity(text.len() + 1);
    let mut units = 0;
    for (byte, c) in text.char_indices() {
        offsets.push((units, byte));
        units += c.len_utf16();
    }
    offsets.push((units, text.len()));
    offsets
}

// Offsets that fall inside a surrogate pair snap to the next character.
fn byte_offset(offsets: &[(usize, usize)], units: usize) -> usize {
    match offsets.binary_search_by_key(&units, |(u, _)| *u) {
        Ok(i) => offsets[i].1,
        Err(i) => offsets.get(i).map_or_else(|| offsets[offsets.len() - 1].1, |o| o.1),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::document::SpanData;

    fn block(kind: BlockKind, text: &str, spans: Vec<Span>) -> RichTextBlock {
        RichTextBlock {
            kind,
            text: Some(text.to_owned()),
            spans,
            url: None,
            alt: None,
        }
    }

    fn span(start: usize, end: usize, kind: SpanKind) -> Span {
        Span {
            start,
            end,
            kind,
            data: None,
        }
    }

    #[test]
    fn test_paragraph_is_escaped() -> io::Result<()> {
        let html = to_html(&[block(BlockKind::Paragraph, "a < b & c", Vec::new())])?;
        assert_eq!("<p>a &lt; b &amp; c</p>", html);
        Ok(())
    }

    #[test]
    fn test_headings_and_preformatted() -> io::Result<()> {
        let html = to_html(&[
            block(BlockKind::Heading3, "Title", Vec::new()),
            block(BlockKind::Preformatted, "let x = 1;", Vec::new()),
        ])?;
        assert_eq!("<h3>Title</h3><pre>let x = 1;</pre>", html);
        Ok(())
    }

    #[test]
    fn test_list_items_are_grouped() -> io::Result<()> {
        let html = to_html(&[
            block(BlockKind::ListItem, "one", Vec::new()),
            block(BlockKind::ListItem, "two", Vec::new()),
            block(BlockKind::OListItem, "first", Vec::new()),
            block(BlockKind::Paragraph, "after", Vec::new()),
        ])?;
        assert_eq!(
            "<ul><li>one</li><li>two</li></ul><ol><li>first</li></ol><p>after</p>",
            html
        );
        Ok(())
    }

    #[test]
    fn test_overlapping_spans_nest() -> io::Result<()> {
        let html = to_html(&[block(
            BlockKind::Paragraph,
            "bold and both",
            vec![span(0, 13, SpanKind::Strong), span(5, 13, SpanKind::Em)],
        )])?;
        assert_eq!(
            "<p><strong>bold </strong><strong><em>and both</em></strong></p>",
            html
        );
        Ok(())
    }

    #[test]
    fn test_hyperlink_span() -> io::Result<()> {
        let mut link = span(4, 9, SpanKind::Hyperlink);
        link.data = Some(SpanData {
            url: Some(String::from("https://example.org/?a=1&b=2")),
        });
        let html = to_html(&[block(BlockKind::Paragraph, "see hooks", vec![link])])?;
        assert_eq!(
            r#"<p>see <a href="https://example.org/?a=1&amp;b=2">hooks</a></p>"#,
            html
        );
        Ok(())
    }

    #[test]
    fn test_span_offsets_are_utf16() -> io::Result<()> {
        // "ção" is 3 UTF-16 units but 5 bytes; the emoji is 2 units.
        let html = to_html(&[block(
            BlockKind::Paragraph,
            "ção 🚀 ok",
            vec![span(7, 9, SpanKind::Em)],
        )])?;
        assert_eq!("<p>ção 🚀 <em>ok</em></p>", html);
        Ok(())
    }

    #[test]
    fn test_sections_get_anchored_headings() -> io::Result<()> {
        let sections = vec![
            ContentSection {
                heading: Some(String::from("Proin et varius")),
                body: vec![block(BlockKind::Paragraph, "Nullam dolor", Vec::new())],
            },
            ContentSection {
                heading: Some(String::from("  ")),
                body: Vec::new(),
            },
        ];
        let mut html = String::new();
        render_sections(&mut html, &sections)?;
        assert_eq!(
            r#"<div><h2 id="proin-et-varius">Proin et varius</h2><p>Nullam dolor</p></div><div></div>"#,
            html
        );
        Ok(())
    }

    #[test]
    fn test_image_and_unsupported_blocks() -> io::Result<()> {
        let image = RichTextBlock {
            kind: BlockKind::Image,
            text: None,
            spans: Vec::new(),
            url: Some(String::from("https://images.prismic.io/banner.png")),
            alt: Some(String::from("a \"banner\"")),
        };
        let embed = block(BlockKind::Unsupported, "ignored", Vec::new());
        let html = to_html(&[image, embed])?;
        assert_eq!(
            r#"<p class="block-img"><img src="https://images.prismic.io/banner.png" alt="a &quot;banner&quot;"></p>"#,
            html
        );
        Ok(())
    }
}
