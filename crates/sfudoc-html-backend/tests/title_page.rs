use pretty_assertions::assert_eq;
use sfudoc_html_backend::{render_document, HtmlRenderOptions};
use sfudoc_ir::{Block, Document, Inline, TitleBlock, TitlePage};

#[test]
fn title_page_is_one_container_before_the_body() {
    let doc = Document::new(vec![Block::PageBreak]).with_title_page(TitlePage {
        geometry: Some("left=20mm".to_string()),
        blocks: vec![
            TitleBlock::Center(vec![vec![Inline::text("СФУ")], Vec::new()]),
            TitleBlock::VSpace,
            TitleBlock::Signatures(vec![vec![
                vec![Inline::text("Студент")],
                vec![Inline::SignatureLine],
            ]]),
        ],
    });
    let out = render_document(&doc, &HtmlRenderOptions::default());
    assert_eq!(
        out,
        concat!(
            r#"<div data-type="title-page" class="title-page" data-geometry="left=20mm">"#,
            r#"<div data-type="title-center" class="title-center"><p>СФУ</p><p></p></div>"#,
            r#"<div data-type="vspace" class="vspace"></div>"#,
            r#"<table data-type="signature-table" class="signature-table"><tbody><tr>"#,
            r#"<td>Студент</td>"#,
            r#"<td><span data-type="signature-line" class="signature-line">____________________</span></td>"#,
            r#"</tr></tbody></table></div>"#,
            r#"<div data-type="page-break" class="page-break"><span>Разрыв страницы (\newpage)</span></div>"#,
        )
    );
}

#[test]
fn nbsp_is_written_as_entity() {
    let doc = Document::new(vec![Block::Paragraph(vec![Inline::text("1\u{a0}кг")])]);
    let out = render_document(&doc, &HtmlRenderOptions::default());
    assert_eq!(out, "<p>1&nbsp;кг</p>");
}
