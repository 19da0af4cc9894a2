use super::{Error, SyntaxError};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

/// Renders compile errors against the source they were found in.
pub struct ErrorReporter<'a> {
    file: SimpleFile<&'a str, &'a str>,
}

impl<'a> ErrorReporter<'a> {
    pub fn new(name: &'a str, source: &'a str) -> Self {
        Self {
            file: SimpleFile::new(name, source),
        }
    }

    pub fn report_error(&self, e: &Error) -> Result<(), codespan_reporting::files::Error> {
        let writer = StandardStream::stderr(ColorChoice::Auto);
        let config = term::Config::default();

        for diagnostic in self.diagnostics(e) {
            term::emit(&mut writer.lock(), &config, &self.file, &diagnostic)?;
        }
        Ok(())
    }

    pub fn diagnostics(&self, e: &Error) -> Vec<Diagnostic<()>> {
        e.syntax_errors().iter().map(Self::diagnostic).collect()
    }

    fn diagnostic(e: &SyntaxError) -> Diagnostic<()> {
        Diagnostic::error()
            .with_code("E001")
            .with_message(e.to_string())
            .with_labels(vec![
                Label::primary((), e.span.clone()).with_message(e.message.clone())
            ])
    }
}
