//! One method per well-known tag type.

use kqcode_core::consts::{ANONYMOUS, ANONYMOUS_COMPULSORY, AT_ALL, DICE, RPS, SHAKE};
use kqcode_core::{Code, MapCode, render_code};

fn flag(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Produces codes of the well-known tag types.
///
/// Implementors supply [`make`](Self::make) and [`constant`](Self::constant);
/// every tag method is defined in terms of those two. Optional parameters
/// are left out of the code when `None`.
pub trait CodeTemplate {
    /// What each method returns: token text or a code value.
    type Output;

    /// Produce a code from a type and decoded parameter values, in order.
    fn make(&self, code_type: &'static str, params: &[(&'static str, &str)]) -> Self::Output;

    /// Produce one of the shared constant codes.
    fn constant(&self, code: &MapCode) -> Self::Output;

    /// `[CQ:at,qq=..]`: mention one user.
    fn at(&self, qq: &str) -> Self::Output {
        self.make("at", &[("qq", qq)])
    }

    /// `[CQ:at,qq=all]`: mention everyone.
    fn at_all(&self) -> Self::Output {
        self.constant(&AT_ALL)
    }

    /// `[CQ:face,id=..]`: built-in face.
    fn face(&self, id: &str) -> Self::Output {
        self.make("face", &[("id", id)])
    }

    /// `[CQ:bface,id=..]`: big face.
    fn bface(&self, id: &str) -> Self::Output {
        self.make("bface", &[("id", id)])
    }

    /// `[CQ:sface,id=..]`: small face.
    fn sface(&self, id: &str) -> Self::Output {
        self.make("sface", &[("id", id)])
    }

    /// `[CQ:image,file=..,destruct=..]`: picture, optionally flash (self-destructing).
    fn image(&self, file: &str, destruct: bool) -> Self::Output {
        self.make("image", &[("file", file), ("destruct", flag(destruct))])
    }

    /// `[CQ:record,file=..,magic=..]`: voice message, optionally voice-changed.
    fn record(&self, file: &str, magic: bool) -> Self::Output {
        self.make("record", &[("file", file), ("magic", flag(magic))])
    }

    /// `[CQ:rps]`: random rock-paper-scissors.
    fn rps(&self) -> Self::Output {
        self.constant(&RPS)
    }

    /// `[CQ:rps,type=..]`: a fixed rock-paper-scissors throw.
    fn rps_of(&self, rps_type: &str) -> Self::Output {
        self.make("rps", &[("type", rps_type)])
    }

    /// `[CQ:dice]`: random die roll.
    fn dice(&self) -> Self::Output {
        self.constant(&DICE)
    }

    /// `[CQ:dice,type=..]`: a fixed die face.
    fn dice_of(&self, dice_type: &str) -> Self::Output {
        self.make("dice", &[("type", dice_type)])
    }

    /// `[CQ:shake]`: window shake.
    fn shake(&self) -> Self::Output {
        self.constant(&SHAKE)
    }

    /// `[CQ:anonymous,ignore=true]` when `ignore`, otherwise `[CQ:anonymous]`.
    ///
    /// With `ignore` the message is still sent if anonymity fails.
    fn anonymous(&self, ignore: bool) -> Self::Output {
        if ignore {
            self.constant(&ANONYMOUS)
        } else {
            self.constant(&ANONYMOUS_COMPULSORY)
        }
    }

    /// `[CQ:music,type=..,id=..(,style=..)]`: platform music share.
    fn music(&self, music_type: &str, id: &str, style: Option<&str>) -> Self::Output {
        match style {
            Some(style) => self.make(
                "music",
                &[("type", music_type), ("id", id), ("style", style)],
            ),
            None => self.make("music", &[("type", music_type), ("id", id)]),
        }
    }

    /// `[CQ:music,type=custom,url=..,audio=..,title=..(,content=..)(,image=..)]`.
    fn custom_music(
        &self,
        url: &str,
        audio: &str,
        title: &str,
        content: Option<&str>,
        image: Option<&str>,
    ) -> Self::Output {
        let mut params = vec![
            ("type", "custom"),
            ("url", url),
            ("audio", audio),
            ("title", title),
        ];
        params.extend(content.map(|c| ("content", c)));
        params.extend(image.map(|i| ("image", i)));
        self.make("music", &params)
    }

    /// `[CQ:share,url=..,title=..(,content=..)(,image=..)]`: link share.
    fn share(
        &self,
        url: &str,
        title: &str,
        content: Option<&str>,
        image: Option<&str>,
    ) -> Self::Output {
        let mut params = vec![("url", url), ("title", title)];
        params.extend(content.map(|c| ("content", c)));
        params.extend(image.map(|i| ("image", i)));
        self.make("share", &params)
    }

    /// `[CQ:location,lat=..,lon=..,title=..,content=..]`: location pin.
    fn location(&self, lat: &str, lon: &str, title: &str, content: &str) -> Self::Output {
        self.make(
            "location",
            &[("lat", lat), ("lon", lon), ("title", title), ("content", content)],
        )
    }
}

/// Renders token text directly, without building a parameter store.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringTemplate;

impl CodeTemplate for StringTemplate {
    type Output = String;

    fn make(&self, code_type: &'static str, params: &[(&'static str, &str)]) -> String {
        render_code(code_type, params.iter().copied())
    }

    fn constant(&self, code: &MapCode) -> String {
        code.render().into_owned()
    }
}

/// Produces immutable [`MapCode`] values. Constants are shared, not rebuilt.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeValueTemplate;

impl CodeTemplate for CodeValueTemplate {
    type Output = MapCode;

    fn make(&self, code_type: &'static str, params: &[(&'static str, &str)]) -> MapCode {
        MapCode::from_static(code_type, params.iter().copied())
    }

    fn constant(&self, code: &MapCode) -> MapCode {
        code.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kqcode_core::parse_code;

    #[test]
    fn string_template_renders_tokens() {
        let t = StringTemplate;
        assert_eq!(t.at("123"), "[CQ:at,qq=123]");
        assert_eq!(t.at_all(), "[CQ:at,qq=all]");
        assert_eq!(t.face("14"), "[CQ:face,id=14]");
        assert_eq!(t.image("a.jpg", true), "[CQ:image,file=a.jpg,destruct=true]");
        assert_eq!(t.record("v.amr", false), "[CQ:record,file=v.amr,magic=false]");
        assert_eq!(t.rps(), "[CQ:rps]");
        assert_eq!(t.rps_of("1"), "[CQ:rps,type=1]");
        assert_eq!(t.dice_of("6"), "[CQ:dice,type=6]");
        assert_eq!(t.shake(), "[CQ:shake]");
        assert_eq!(t.anonymous(true), "[CQ:anonymous,ignore=true]");
        assert_eq!(t.anonymous(false), "[CQ:anonymous]");
    }

    #[test]
    fn optional_params_are_omitted() {
        let t = StringTemplate;
        assert_eq!(t.music("qq", "5", None), "[CQ:music,type=qq,id=5]");
        assert_eq!(
            t.music("qq", "5", Some("1")),
            "[CQ:music,type=qq,id=5,style=1]"
        );
        assert_eq!(t.share("u", "t", None, Some("i")), "[CQ:share,url=u,title=t,image=i]");
        assert_eq!(
            t.custom_music("u", "a", "t", Some("c"), None),
            "[CQ:music,type=custom,url=u,audio=a,title=t,content=c]"
        );
    }

    #[test]
    fn values_are_escaped() {
        let t = StringTemplate;
        assert_eq!(
            t.share("http://x/?a=1&b=2", "[hi], there", None, None),
            "[CQ:share,url=http://x/?a=1&amp;b=2,title=&#91;hi&#93;&#44; there]"
        );
        assert_eq!(
            parse_code(&t.location("1.5", "2.5", "a,b", "")).unwrap().get("title").as_deref(),
            Some("a,b")
        );
    }

    #[test]
    fn value_template_builds_codes() {
        let t = CodeValueTemplate;
        let code = t.image("a,b.jpg", false);
        assert_eq!(code.code_type(), "image");
        assert_eq!(code.get("file").as_deref(), Some("a,b.jpg"));
        assert_eq!(code.get("destruct").as_deref(), Some("false"));
        assert_eq!(t.dice(), *DICE);
    }

    #[test]
    fn templates_agree() {
        let s = StringTemplate;
        let v = CodeValueTemplate;
        let pairs = [
            (s.at("1"), v.at("1")),
            (s.bface("2"), v.bface("2")),
            (s.sface("3"), v.sface("3")),
            (s.anonymous(false), v.anonymous(false)),
            (
                s.custom_music("u", "a", "t,1", None, Some("i")),
                v.custom_music("u", "a", "t,1", None, Some("i")),
            ),
            (
                s.location("39.9", "116.3", "here", "there"),
                v.location("39.9", "116.3", "here", "there"),
            ),
        ];
        for (text, code) in pairs {
            assert_eq!(text, code.render());
            assert_eq!(parse_code(&text).unwrap(), code);
        }
    }
}
