use std::io::Write;

use crate::{error::Result, quark::Quark};

use super::tagger::Tagger;

pub trait Model {
    fn tagger(&self) -> impl Tagger;
    fn labels(&self) -> &Quark;
    fn vocabulary(&self) -> &Quark;
    fn dump<W: Write>(&self, writer: W) -> Result<()>;
}
