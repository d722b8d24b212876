/// Class names for one style prefix: the tweet block is `<prefix>`, its parts
/// are `<prefix>_<part>`.
#[derive(Clone, Debug)]
pub struct Classes {
    prefix: String,
}

impl Classes {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    pub fn tweet(&self) -> String {
        self.prefix.clone()
    }

    pub fn part(&self, part: &str) -> String {
        format!("{}_{}", self.prefix, part)
    }

    pub fn stylesheet(&self) -> String {
        let p = &self.prefix;
        [
            format!(".{p}_thread {{ width: 600px }}"),
            format!(".{p} {{ margin: 1%; border: solid 1px; width: 94%; padding: 2%; font-family: sans-serif; font-size: small }}"),
            format!(".{p}_avatar {{ display: inline-block; position: relative; width: 48px; height: 48px; overflow: hidden; border-radius: 50%; float: left; margin-right: 10px; margin-bottom: 10px }}"),
            format!(".{p}_avatar img {{ width: 100%; height: 100% }}"),
            format!(".{p}_header {{ margin-left: 60px }}"),
            format!(".{p}_displayname {{ font-weight: bold }}"),
            format!(".{p}_username {{ color: gray }}"),
            format!(".{p}_timestamp {{ color: gray }}"),
            format!(".{p}_id {{ float: right; display: none }}"),
            format!(".{p}_reply {{ margin-left: 60px; color: gray }}"),
            format!(".{p}_replyid {{ font-size: x-small }}"),
            format!(".{p}_body {{ margin-top: 2%; margin-left: 60px }}"),
            format!(".{p}_media {{ margin-top: 2% }}"),
            format!(".{p}_img {{ width: 100% }}"),
            format!(".{p}_video {{ width: 100% }}"),
            format!(".{p}_quotes {{ margin-top: 2%; padding: 0; list-style: none }}"),
            format!(".{p}_original {{ margin-top: 2%; text-align: center; font-size: x-small }}"),
        ]
        .join("\n")
    }
}
