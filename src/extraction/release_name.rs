//! Regex based release name extractor
//!
//! Understands the usual scene naming conventions:
//! - "Show.S02E05.Episode.Title.720p.HDTV.x264-GRP"
//! - "Show 2x05 720p"
//! - "Show.Season2.Complete" / "Show.S02.1080p" (season packs)
//! - "Movie.Name.2010.1080p.BluRay.DTS.x264-GRP"

use super::{ExtractedInfo, MetadataExtractor, attribute};
use once_cell::sync::Lazy;
use regex::{Match, Regex};

/// Known file extensions stripped before guessing
static EXTENSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(mkv|mp4|m4v|avi|wmv|mov|mpg|ts|srt|sub|ass|ssa|zip|rar)$").unwrap()
});

/// S02E05, S02.E05 and multi episode S02E05E06
static EPISODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[\s._-])S(\d{1,2})[\s._-]?E(\d{1,3})(?:[\s._-]?E\d{1,3})*").unwrap()
});

/// "Season 2 Episode 5"
static VERBOSE_EPISODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[\s._-])Season[\s._-]?(\d{1,2})[\s._-]*Episode[\s._-]?(\d{1,3})")
        .unwrap()
});

/// 2x05
static CROSS_EPISODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[\s._-])(\d{1,2})x(\d{2,3})(?:$|[\s._-])").unwrap());

/// Season packs: S02, Season2, Season.2
static SEASON_ONLY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[\s._-])(?:S|Season[\s._-]?)(\d{1,2})(?:$|[\s._-])").unwrap()
});

static YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[\s._(\[-])((?:19|20)\d{2})(?:$|[\s._)\]-])").unwrap()
});

static SCREEN_SIZE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[\s._-])(2160p|1080p|1080i|720p|576p|480p|4k)(?:$|[\s._-])").unwrap()
});

static FORMAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:^|[\s._-])(blu-?ray|bdrip|brrip|web-?dl|webrip|web|hdtv|dvdrip|dvd)(?:$|[\s._-])",
    )
    .unwrap()
});

static VIDEO_CODEC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[\s._-])(x264|h\.?264|avc|x265|h\.?265|hevc|xvid|divx)(?:$|[\s._-])")
        .unwrap()
});

static AUDIO_CODEC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:^|[\s._-])(aac|ac3|ddp5\.1|ddp|dd5\.1|eac3|dts|flac|mp3)(?:$|[\s._-])",
    )
    .unwrap()
});

static HEARING_IMPAIRED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[\s._-])(hi|sdh)(?:$|[\s._-])").unwrap());

/// Trailing "-GROUP"
static GROUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-([A-Za-z0-9]+)$").unwrap());

static SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s._]+").unwrap());

/// Default metadata extractor working on scene style release names.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseNameExtractor;

impl ReleaseNameExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataExtractor for ReleaseNameExtractor {
    fn extract(&self, release_name: &str) -> ExtractedInfo {
        let mut info = ExtractedInfo::new();
        let stem = EXTENSION_RE.replace(release_name.trim(), "");

        // A trailing dash suffix only counts as a group in dotted/spaced names
        let mut body: &str = &stem;
        if let Some(caps) = GROUP_RE.captures(&stem) {
            let whole = caps.get(0).map(|m| m.start()).unwrap_or(0);
            if stem[..whole].contains(['.', ' ', '_']) {
                info.insert(attribute::RELEASE_GROUP, caps[1].to_string());
                body = &stem[..whole];
            }
        }

        // Positions where the free-text title ends
        let mut boundaries: Vec<usize> = Vec::new();
        let mut episode_marker: Option<Match<'_>> = None;

        if let Some(caps) = EPISODE_RE
            .captures(body)
            .or_else(|| VERBOSE_EPISODE_RE.captures(body))
            .or_else(|| CROSS_EPISODE_RE.captures(body))
        {
            if let (Some(season), Some(episode)) = (parse_group(&caps, 1), parse_group(&caps, 2)) {
                info.insert(attribute::SEASON, season);
                info.insert(attribute::EPISODE, episode);
            }
            episode_marker = caps.get(0);
        } else if let Some(caps) = SEASON_ONLY_RE.captures(body) {
            if let Some(season) = parse_group(&caps, 1) {
                info.insert(attribute::SEASON, season);
            }
            boundaries.extend(caps.get(0).map(|m| m.start()));
        }

        if let Some(m) = episode_marker {
            boundaries.push(m.start());
        }

        if let Some(caps) = YEAR_RE.captures(body) {
            let whole = caps.get(0).map(|m| m.start()).unwrap_or(0);
            // A leading number is part of the title ("2012.2009.720p")
            if whole > 0 {
                if let Some(year) = parse_group(&caps, 1) {
                    info.insert(attribute::YEAR, year);
                }
                boundaries.push(whole);
            }
        }

        let technical: [(&Regex, &str, fn(&str) -> String); 4] = [
            (&*SCREEN_SIZE_RE, attribute::SCREEN_SIZE, normalize_screen_size),
            (&*FORMAT_RE, attribute::FORMAT, normalize_format),
            (&*VIDEO_CODEC_RE, attribute::VIDEO_CODEC, normalize_video_codec),
            (&*AUDIO_CODEC_RE, attribute::AUDIO_CODEC, normalize_audio_codec),
        ];

        for (re, name, normalize) in technical {
            if let Some(caps) = re.captures(body) {
                info.insert(name, normalize(&caps[1]));
                boundaries.extend(caps.get(0).map(|m| m.start()));
            }
        }

        if let Some(m) = HEARING_IMPAIRED_RE.find(body) {
            info.insert(attribute::HEARING_IMPAIRED, true);
            boundaries.push(m.start());
        }

        let title_end = boundaries.iter().copied().min().unwrap_or(body.len());
        let title = clean_title(&body[..title_end]);
        if !title.is_empty() {
            info.insert(attribute::TITLE, title);
        }

        if let Some(marker) = episode_marker {
            let rest_end = boundaries
                .iter()
                .copied()
                .filter(|&b| b >= marker.end())
                .min()
                .unwrap_or(body.len());
            if rest_end > marker.end() {
                let episode_title = clean_title(&body[marker.end()..rest_end]);
                if !episode_title.is_empty() {
                    info.insert(attribute::EPISODE_TITLE, episode_title);
                }
            }
        }

        info
    }
}

fn parse_group(caps: &regex::Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index).and_then(|m| m.as_str().parse().ok())
}

fn clean_title(raw: &str) -> String {
    SEPARATOR_RE
        .replace_all(raw, " ")
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '(' | '[' | ')' | ']'))
        .to_string()
}

fn normalize_screen_size(raw: &str) -> String {
    match raw.to_lowercase().as_str() {
        "4k" => "2160p".to_string(),
        other => other.to_string(),
    }
}

fn normalize_format(raw: &str) -> String {
    match raw.to_lowercase().replace('-', "").as_str() {
        "bluray" | "bdrip" | "brrip" => "BluRay",
        "webdl" | "web" => "WEB-DL",
        "webrip" => "WEBRip",
        "hdtv" => "HDTV",
        _ => "DVD",
    }
    .to_string()
}

fn normalize_video_codec(raw: &str) -> String {
    match raw.to_lowercase().replace('.', "").as_str() {
        "x264" | "h264" | "avc" => "h264",
        "x265" | "h265" | "hevc" => "h265",
        "xvid" => "XviD",
        _ => "DivX",
    }
    .to_string()
}

fn normalize_audio_codec(raw: &str) -> String {
    match raw.to_lowercase().as_str() {
        "aac" => "AAC",
        "ac3" | "dd5.1" => "AC3",
        "ddp" | "ddp5.1" | "eac3" => "EAC3",
        "dts" => "DTS",
        "flac" => "FLAC",
        _ => "MP3",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::AttrValue;

    fn extract(name: &str) -> ExtractedInfo {
        ReleaseNameExtractor.extract(name)
    }

    #[test]
    fn test_episode_release() {
        let info = extract("Show.S02E05.720p-GRP");
        assert_eq!(info.text(attribute::TITLE), Some("Show"));
        assert_eq!(info.number(attribute::SEASON), Some(2));
        assert_eq!(info.number(attribute::EPISODE), Some(5));
        assert_eq!(info.text(attribute::SCREEN_SIZE), Some("720p"));
        assert_eq!(info.text(attribute::RELEASE_GROUP), Some("GRP"));
        assert!(!info.contains(attribute::EPISODE_TITLE));
    }

    #[test]
    fn test_episode_title_and_codecs() {
        let info = extract("The.Show.S01E02.The.Second.One.1080p.WEB-DL.DDP5.1.H.264-NTb.mkv");
        assert_eq!(info.text(attribute::TITLE), Some("The Show"));
        assert_eq!(info.text(attribute::EPISODE_TITLE), Some("The Second One"));
        assert_eq!(info.text(attribute::FORMAT), Some("WEB-DL"));
        assert_eq!(info.text(attribute::AUDIO_CODEC), Some("EAC3"));
        assert_eq!(info.text(attribute::VIDEO_CODEC), Some("h264"));
        assert_eq!(info.text(attribute::RELEASE_GROUP), Some("NTb"));
    }

    #[test]
    fn test_season_pack() {
        let info = extract("Show.Season2.Complete");
        assert_eq!(info.text(attribute::TITLE), Some("Show"));
        assert_eq!(info.number(attribute::SEASON), Some(2));
        assert!(!info.contains(attribute::EPISODE));
        assert!(!info.contains(attribute::RELEASE_GROUP));

        let info = extract("Show S03 1080p BluRay");
        assert_eq!(info.number(attribute::SEASON), Some(3));
        assert_eq!(info.text(attribute::FORMAT), Some("BluRay"));
    }

    #[test]
    fn test_cross_and_verbose_notation() {
        let info = extract("Show 2x07 HDTV");
        assert_eq!(info.number(attribute::SEASON), Some(2));
        assert_eq!(info.number(attribute::EPISODE), Some(7));
        assert_eq!(info.text(attribute::TITLE), Some("Show"));

        let info = extract("Show Season 4 Episode 12");
        assert_eq!(info.number(attribute::SEASON), Some(4));
        assert_eq!(info.number(attribute::EPISODE), Some(12));
    }

    #[test]
    fn test_movie_release() {
        let info = extract("Movie.Name.2010.1080p.BluRay.DTS.x264-GRP");
        assert_eq!(info.text(attribute::TITLE), Some("Movie Name"));
        assert_eq!(info.number(attribute::YEAR), Some(2010));
        assert_eq!(info.text(attribute::SCREEN_SIZE), Some("1080p"));
        assert_eq!(info.text(attribute::FORMAT), Some("BluRay"));
        assert_eq!(info.text(attribute::AUDIO_CODEC), Some("DTS"));
        assert_eq!(info.text(attribute::VIDEO_CODEC), Some("h264"));
        assert!(!info.contains(attribute::SEASON));
    }

    #[test]
    fn test_hearing_impaired_marker() {
        let info = extract("Movie.2012.720p.HI");
        assert_eq!(info.get(attribute::HEARING_IMPAIRED), Some(&AttrValue::Flag(true)));
    }

    #[test]
    fn test_garbage_input_never_fails() {
        assert!(extract("").is_empty());
        let info = extract("¯\\_(ツ)_/¯");
        assert!(!info.contains(attribute::SEASON));
    }

    #[test]
    fn test_dash_in_title_is_not_a_group() {
        let info = extract("Spider-Man");
        assert_eq!(info.text(attribute::TITLE), Some("Spider-Man"));
        assert!(!info.contains(attribute::RELEASE_GROUP));
    }

    #[test]
    fn test_patterns_compile() {
        for pattern in [
            &EXTENSION_RE,
            &EPISODE_RE,
            &VERBOSE_EPISODE_RE,
            &CROSS_EPISODE_RE,
            &SEASON_ONLY_RE,
            &YEAR_RE,
            &SCREEN_SIZE_RE,
            &FORMAT_RE,
            &VIDEO_CODEC_RE,
            &AUDIO_CODEC_RE,
            &HEARING_IMPAIRED_RE,
            &GROUP_RE,
            &SEPARATOR_RE,
        ] {
            Lazy::force(pattern);
        }
    }
}
