//! HTML extraction for the three letras.mus.br page kinds.
//!
//! Pure functions from raw markup to candidate records. Structural
//! surprises yield "no data" (`None` or an empty list), never errors;
//! nothing here is retried.

use crate::models::{ArtistPage, ArtistRef, SongPage, SongRef};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static ANCHOR: Lazy<Selector> = Lazy::new(|| sel("a[href]"));
static VIEWS_COUNTER: Lazy<Selector> = Lazy::new(|| sel("div.head-info-exib b"));
static SONG_LIST_DEFAULT: Lazy<Selector> = Lazy::new(|| sel("div.artista-todas"));
static SONG_LIST_TOP: Lazy<Selector> = Lazy::new(|| sel("div.artistTopSongs"));
static SONG_ROW: Lazy<Selector> = Lazy::new(|| sel("li.songList-table-row"));
static SONG_NAME_LINK: Lazy<Selector> = Lazy::new(|| sel("a.songList-table-songName"));
static LYRICS_BLOCK: Lazy<Selector> = Lazy::new(|| sel("div.lyric-original"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| sel("p"));

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Extract `{name, slug}` artist links from the index page.
///
/// Only anchors whose href is a bare one-segment path count as artist
/// links; navigation and footer anchors fall out of that shape.
pub fn artist_index(html: &str) -> Vec<ArtistRef> {
    let doc = Html::parse_document(html);

    doc.select(&ANCHOR)
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            let slug = href.trim_matches('/');
            if slug.is_empty() || slug.contains('/') {
                return None;
            }
            let name = element_text(link);
            if name.is_empty() {
                return None;
            }
            Some(ArtistRef {
                name,
                slug: slug.to_string(),
            })
        })
        .collect()
}

/// Extract views and the song list from an artist page.
///
/// Tries the default all-songs layout first, then the top-songs layout;
/// the site serves either depending on the artist.
pub fn artist_page(html: &str) -> ArtistPage {
    let doc = Html::parse_document(html);

    let mut songs = songs_from_container(&doc, &SONG_LIST_DEFAULT);
    if songs.is_empty() {
        songs = songs_from_container(&doc, &SONG_LIST_TOP);
    }

    ArtistPage {
        views: views_counter(&doc),
        songs,
    }
}

/// Extract views and paragraph-joined lyrics from a song page.
///
/// Paragraph structure is the contract: text nodes within a `<p>` joined
/// by `\n`, paragraphs joined by a blank line. Returns `None` when the
/// lyrics block is absent or empty.
pub fn song_page(html: &str) -> Option<SongPage> {
    let doc = Html::parse_document(html);

    let block = doc.select(&LYRICS_BLOCK).next()?;
    let paragraphs: Vec<String> = block
        .select(&PARAGRAPH)
        .map(|p| {
            p.text()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect();

    let content = paragraphs.join("\n\n");
    if content.trim().is_empty() {
        return None;
    }

    Some(SongPage {
        views: views_counter(&doc).unwrap_or(0),
        content,
    })
}

/// The site renders view counts with dot thousands separators ("1.234.567").
fn views_counter(doc: &Html) -> Option<i64> {
    let text = element_text(doc.select(&VIEWS_COUNTER).next()?);
    text.replace('.', "").parse().ok()
}

fn songs_from_container(doc: &Html, container: &Selector) -> Vec<SongRef> {
    let Some(div) = doc.select(container).next() else {
        return Vec::new();
    };

    div.select(&SONG_ROW)
        .filter_map(|row| {
            // The default layout names its link; the top-songs layout uses
            // a plain anchor with the name in the title attribute.
            let link = row
                .select(&SONG_NAME_LINK)
                .next()
                .or_else(|| row.select(&ANCHOR).next())?;

            let href = link.value().attr("href")?.trim_matches('/');
            let slug = href.rsplit('/').next()?.to_string();
            if slug.is_empty() {
                return None;
            }

            let name = link
                .value()
                .attr("title")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| element_text(link));
            if name.is_empty() {
                return None;
            }

            Some(SongRef { name, slug })
        })
        .collect()
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_extracts_bare_slugs_only() {
        let html = r#"
            <html><body>
                <a href="/aline-barros/">Aline Barros</a>
                <a href="/fernandinho/">Fernandinho</a>
                <a href="/estilos/gospelreligioso/">Gospel</a>
                <a href="/">Home</a>
                <a href="/anon/"></a>
            </body></html>
        "#;

        let artists = artist_index(html);
        assert_eq!(artists.len(), 2);
        assert_eq!(artists[0].name, "Aline Barros");
        assert_eq!(artists[0].slug, "aline-barros");
        assert_eq!(artists[1].slug, "fernandinho");
    }

    #[test]
    fn artist_page_default_layout() {
        let html = r#"
            <div class="head-info-exib"><b>1.234.567</b></div>
            <div class="artista-todas">
                <ul>
                    <li class="songList-table-row">
                        <a class="songList-table-songName" href="/aline-barros/ressuscita-me/">Ressuscita-me</a>
                    </li>
                    <li class="songList-table-row">
                        <a class="songList-table-songName" href="/aline-barros/sonda-me/">Sonda-me</a>
                    </li>
                </ul>
            </div>
        "#;

        let page = artist_page(html);
        assert_eq!(page.views, Some(1_234_567));
        assert_eq!(page.songs.len(), 2);
        assert_eq!(page.songs[0].slug, "ressuscita-me");
        assert_eq!(page.songs[1].name, "Sonda-me");
    }

    #[test]
    fn artist_page_falls_back_to_top_songs_layout() {
        let html = r#"
            <div class="artistTopSongs">
                <ul>
                    <li class="songList-table-row">
                        <a href="/fernandinho/uma-nova-historia/" title="Uma Nova História"></a>
                    </li>
                </ul>
            </div>
        "#;

        let page = artist_page(html);
        assert_eq!(page.views, None);
        assert_eq!(page.songs.len(), 1);
        assert_eq!(page.songs[0].name, "Uma Nova História");
        assert_eq!(page.songs[0].slug, "uma-nova-historia");
    }

    #[test]
    fn song_page_preserves_paragraph_structure() {
        let html = r#"
            <div class="head-info-exib"><b>48.210</b></div>
            <div class="lyric-original">
                <p>First line<br>Second line</p>
                <p>Fourth line after empty line<br>Last line</p>
            </div>
        "#;

        let page = song_page(html).unwrap();
        assert_eq!(page.views, 48_210);
        assert_eq!(
            page.content,
            "First line\nSecond line\n\nFourth line after empty line\nLast line"
        );
    }

    #[test]
    fn song_page_without_lyrics_block_is_no_data() {
        assert!(song_page("<html><body><p>nothing here</p></body></html>").is_none());
    }

    #[test]
    fn song_page_with_empty_block_is_no_data() {
        assert!(song_page(r#"<div class="lyric-original"><p>  </p></div>"#).is_none());
    }
}
