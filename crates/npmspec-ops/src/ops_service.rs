//! The OSC `_service` file: one `download_url` service per tarball.
//!
//! ```xml
//! <services>
//! 	<service name="download_url" mode="localonly">
//! 		<param name="protocol">https</param>
//! 		<param name="host">registry.npmjs.org</param>
//! 		<param name="path">/ms/-/ms-2.1.3.tgz</param>
//! 	</service>
//! </services>
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use npmspec_core::tarball::TarballSet;
use npmspec_util::errors::NpmspecError;
use npmspec_util::fs::{read_optional, write_atomic};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

pub const SERVICE_FILE: &str = "_service";

/// How a regenerated `_service` differs from the one it replaces, by
/// tarball file name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceReport {
    pub added: Vec<String>,
    pub kept: Vec<String>,
    pub removed: Vec<String>,
}

fn xml_error(e: impl std::fmt::Display) -> NpmspecError {
    NpmspecError::Generic {
        message: format!("Failed to write _service: {e}"),
    }
}

pub fn render_service(tarballs: &TarballSet) -> Result<String, NpmspecError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b'\t', 1);
    writer
        .write_event(Event::Start(BytesStart::new("services")))
        .map_err(xml_error)?;

    for url in tarballs.download_urls()? {
        let service = BytesStart::new("service")
            .with_attributes([("name", "download_url"), ("mode", "localonly")]);
        writer.write_event(Event::Start(service)).map_err(xml_error)?;
        for (param, value) in [
            ("protocol", url.protocol.as_str()),
            ("host", url.host.as_str()),
            ("path", url.path.as_str()),
        ] {
            writer
                .write_event(Event::Start(
                    BytesStart::new("param").with_attributes([("name", param)]),
                ))
                .map_err(xml_error)?;
            writer
                .write_event(Event::Text(BytesText::new(value)))
                .map_err(xml_error)?;
            writer
                .write_event(Event::End(BytesEnd::new("param")))
                .map_err(xml_error)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("service")))
            .map_err(xml_error)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("services")))
        .map_err(xml_error)?;
    let mut xml = String::from_utf8(writer.into_inner()).map_err(xml_error)?;
    xml.push('\n');
    Ok(xml)
}

/// File names of the tarballs an existing `_service` downloads.
pub fn parse_service(xml: &str) -> Result<BTreeSet<String>, NpmspecError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut names = BTreeSet::new();
    let mut in_path = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"param" => {
                in_path = e
                    .try_get_attribute("name")
                    .ok()
                    .flatten()
                    .is_some_and(|a| a.value.as_ref() == b"path");
            }
            Ok(Event::Text(ref e)) if in_path => {
                let path = e.unescape().map_err(|e| NpmspecError::Generic {
                    message: format!("Failed to parse _service: {e}"),
                })?;
                if let Some(base) = path.rsplit('/').next().filter(|b| !b.is_empty()) {
                    names.insert(base.to_string());
                }
            }
            Ok(Event::End(_)) => in_path = false,
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(NpmspecError::Generic {
                    message: format!("Failed to parse _service: {e}"),
                });
            }
            _ => {}
        }
    }
    Ok(names)
}

pub fn compare(existing: &BTreeSet<String>, tarballs: &TarballSet) -> Result<ServiceReport, NpmspecError> {
    let fresh: BTreeSet<String> = tarballs
        .download_urls()?
        .iter()
        .map(|u| u.basename().to_string())
        .collect();
    Ok(ServiceReport {
        added: fresh.difference(existing).cloned().collect(),
        kept: fresh.intersection(existing).cloned().collect(),
        removed: existing.difference(&fresh).cloned().collect(),
    })
}

/// A rendered `_service` not yet written to disk.
#[derive(Debug)]
pub struct PendingService {
    pub path: PathBuf,
    pub xml: String,
    pub report: ServiceReport,
}

impl PendingService {
    pub fn write(self) -> Result<ServiceReport, NpmspecError> {
        write_atomic(&self.path, self.xml.as_bytes())?;
        Ok(self.report)
    }
}

/// Render `<dir>/_service` for `tarballs` and compare it against the file it
/// would replace. Nothing is written.
pub fn prepare_service(dir: &Path, tarballs: &TarballSet) -> Result<PendingService, NpmspecError> {
    let path = dir.join(SERVICE_FILE);
    let existing = match read_optional(&path)? {
        Some(xml) => parse_service(&xml)?,
        None => BTreeSet::new(),
    };
    let report = compare(&existing, tarballs)?;
    let xml = render_service(tarballs)?;
    Ok(PendingService { path, xml, report })
}

/// Write `<dir>/_service` for `tarballs`, reporting what changed against the
/// file it replaces.
pub fn write_service(dir: &Path, tarballs: &TarballSet) -> Result<ServiceReport, NpmspecError> {
    prepare_service(dir, tarballs)?.write()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_tarball_layout() {
        let mut tarballs = TarballSet::new();
        tarballs.insert("https://registry.npmjs.org/punycode/-/punycode-2.1.1.tgz");
        let expected = "<services>\n\
            \t<service name=\"download_url\" mode=\"localonly\">\n\
            \t\t<param name=\"protocol\">https</param>\n\
            \t\t<param name=\"host\">registry.npmjs.org</param>\n\
            \t\t<param name=\"path\">/punycode/-/punycode-2.1.1.tgz</param>\n\
            \t</service>\n\
            </services>\n";
        assert_eq!(render_service(&tarballs).unwrap(), expected);
    }

    #[test]
    fn undecodable_path_is_an_error() {
        let xml = "<services><service name=\"download_url\">\
            <param name=\"path\">/a/-/a-1.0.0.tgz&bogus;</param>\
            </service></services>";
        let err = parse_service(xml).unwrap_err();
        assert!(matches!(err, NpmspecError::Generic { .. }), "{err:?}");
    }

    #[test]
    fn parse_reads_path_basenames_only() {
        let mut tarballs = TarballSet::new();
        tarballs.insert("https://registry.npmjs.org/ms/-/ms-2.1.3.tgz");
        tarballs.insert("https://registry.npmjs.org/@scope/util/-/util-1.0.0.tgz");
        let names = parse_service(&render_service(&tarballs).unwrap()).unwrap();
        assert_eq!(
            names.into_iter().collect::<Vec<_>>(),
            ["ms-2.1.3.tgz", "util-1.0.0.tgz"]
        );
    }
}
