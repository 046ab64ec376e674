use pretty_assertions::assert_eq;
use sfudoc::ir::Document;
use sfudoc::{decode, encode, html_to_ir, ImageRegistry};

const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

/// Structure of `html`, compared after the LaTeX round trip.
fn assert_round_trip(html: &str) {
    let encoded = encode(html, &ImageRegistry::new(), None, None);
    let back = decode(&encoded.latex, &encoded.registry);
    let expected: Document = html_to_ir(html);
    let actual: Document = html_to_ir(&back);
    assert_eq!(actual.title_page, expected.title_page, "latex:\n{}", encoded.latex);
    assert_eq!(actual.blocks, expected.blocks, "latex:\n{}", encoded.latex);
}

#[test]
fn heading_and_formatting_survive_exactly() {
    let html = "<h1>Intro</h1><p>Hello <strong>world</strong></p>";
    let encoded = encode(html, &ImageRegistry::new(), None, None);
    assert!(encoded.latex.contains("\\section{Intro}"));
    assert!(encoded.latex.contains("Hello \\textbf{world}"));
    assert_eq!(decode(&encoded.latex, &encoded.registry), html);
}

#[test]
fn inline_styles_and_breaks() {
    assert_round_trip(
        "<h2>Раздел</h2><p><em>курсив</em>, <u>подчёркнутый</u> и <strong><em>оба</em></strong><br>вторая строка</p><h3>Пункт</h3>",
    );
}

#[test]
fn special_characters() {
    assert_round_trip("<p>50% &amp; $5 #1 a_b {x} ~ ^ \\ конец</p>");
}

#[test]
fn non_breaking_space() {
    let html = "<p>1&nbsp;кг</p>";
    let encoded = encode(html, &ImageRegistry::new(), None, None);
    assert!(encoded.latex.contains("1~кг"));
    assert_eq!(decode(&encoded.latex, &encoded.registry), html);
}

#[test]
fn nested_lists() {
    assert_round_trip(
        "<ul><li><p>один</p><ol><li><p>два</p></li><li><p>три</p></li></ol></li><li><p>четыре</p></li></ul>",
    );
}

#[test]
fn tables() {
    assert_round_trip(
        "<table><tbody><tr><td><p>a</p></td><td><p>b</p></td></tr><tr><td><p><strong>c</strong></p></td><td><p>d</p></td></tr></tbody></table>",
    );
}

#[test]
fn figures_keep_image_and_caption() {
    let html = format!(
        "<figure class=\"custom-figure\"><img src=\"{}\" alt=\"Схема\"><figcaption class=\"figure-caption\">Схема</figcaption></figure>",
        PNG
    );
    let encoded = encode(&html, &ImageRegistry::new(), None, None);
    assert!(encoded.latex.contains("\\includegraphics[width=\\textwidth]{image_1.png}"));
    assert!(!encoded.latex.contains("base64"));
    assert_eq!(decode(&encoded.latex, &encoded.registry), html);
}

#[test]
fn page_breaks_and_fills() {
    assert_round_trip(
        "<p>a</p><div data-type=\"page-break\" class=\"page-break\"><span>Разрыв страницы (\\newpage)</span></div><p>b</p><div data-type=\"vspace\" class=\"vspace\"></div><p>c</p>",
    );
}

#[test]
fn title_page() {
    assert_round_trip(concat!(
        "<div data-type=\"title-page\" class=\"title-page\">",
        "<div data-type=\"title-center\" class=\"title-center\"><p>СФУ</p><p></p><p><strong>ОТЧЁТ</strong></p></div>",
        "<div data-type=\"vspace\" class=\"vspace\"></div>",
        "<table data-type=\"signature-table\" class=\"signature-table\"><tbody><tr><td>Студент</td>",
        "<td><span data-type=\"signature-line\" class=\"signature-line\">____________________</span></td>",
        "</tr></tbody></table>",
        "<div data-type=\"title-center\" class=\"title-center\"><p>Красноярск 2024</p></div>",
        "</div>",
        "<p>Текст</p>",
    ));
}

#[test]
fn title_page_geometry() {
    assert_round_trip(
        "<div data-type=\"title-page\" class=\"title-page\" data-geometry=\"left=20mm,right=10mm\"><p>Титул</p></div><p>Текст</p>",
    );
}

#[test]
fn unknown_latex_passes_through_both_ways() {
    let latex = "Текст \\cite{knuth} и \\LaTeX{} здесь\n\n\\begin{equation}x=1\\end{equation}";
    let html = decode(latex, &ImageRegistry::new());
    assert!(html.contains("<code data-type=\"latex\">\\cite{knuth}</code>"));
    let encoded = encode(&html, &ImageRegistry::new(), None, None);
    assert!(encoded.latex.contains("Текст \\cite{knuth} и \\LaTeX{} здесь"));
    assert!(encoded.latex.contains("\\begin{equation}x=1\\end{equation}"));
}

#[test]
fn encoding_is_stable_after_one_round_trip() {
    let html = format!(
        "<h1>Введение</h1><p>Текст с <strong>жирным</strong> и $5</p><ul><li><p>пункт</p></li></ul><figure class=\"custom-figure\"><img src=\"{}\" alt=\"\"><figcaption class=\"figure-caption\"></figcaption></figure>",
        PNG
    );
    let first = encode(&html, &ImageRegistry::new(), None, None);
    let back = decode(&first.latex, &first.registry);
    let second = encode(&back, &first.registry, None, None);
    assert_eq!(second.latex, first.latex);
    assert_eq!(second.registry, first.registry);
}

#[test]
fn reference_list_keeps_leading_brackets() {
    let html = "<ol><li><p>[1] Кнут Д. Искусство программирования</p></li><li><p>[2] Вирт Н.</p></li></ol>";
    let encoded = encode(html, &ImageRegistry::new(), None, None);
    assert!(encoded.latex.contains("\\item {}[1] Кнут Д."));
    assert!(!encoded.latex.contains("\\item ["));
    assert_round_trip(html);
}

#[test]
fn bracket_after_cell_break_survives() {
    let html = "<table><tbody><tr><td><p>Источник<br>[3] ГОСТ</p></td><td><p>b</p></td></tr></tbody></table>";
    let encoded = encode(html, &ImageRegistry::new(), None, None);
    assert!(encoded.latex.contains("Источник\\newline {}[3] ГОСТ & b"));
    assert_round_trip(html);
}

#[test]
fn bracket_after_line_break_compiles() {
    let html = "<p>Источники:<br>[2] Вирт Н.<br>*примечание</p>";
    let encoded = encode(html, &ImageRegistry::new(), None, None);
    assert!(encoded.latex.contains("Источники:\\\\\n{}[2] Вирт Н.\\\\\n{}*примечание"));
    assert_round_trip(html);
}
