use super::byte_code::chunk::LineNumber;
use super::call_frame::CallFrame;
use super::heap::Heap;

#[derive(Debug, Clone, PartialEq)]
pub struct StackInformation {
    // `None` for the top level script
    pub function_name: Option<String>,
    pub line_number: LineNumber,
}

// Active frames at the time of an error, innermost first
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StackTrace {
    frames: Vec<StackInformation>,
}

impl StackTrace {
    // `callers` are the suspended frames, bottom first
    pub fn new(callers: &[CallFrame], active: &CallFrame, heap: &Heap) -> Self {
        let mut info = vec![];

        for frame in callers.iter().chain(std::iter::once(active)) {
            let function_name = frame
                .closure
                .and_then(|c| heap.as_closure(c))
                .and_then(|c| heap.as_function(c.function))
                .and_then(|f| heap.function_name(f))
                .map(String::from);

            info.push(StackInformation {
                function_name,
                line_number: frame.line_number_for_current_instruction().unwrap_or(0),
            });
        }

        info.reverse();
        Self { frames: info }
    }

    pub fn frames(&self) -> &[StackInformation] {
        &self.frames
    }

    // line of the innermost frame, which is where the error happened
    pub fn line(&self) -> LineNumber {
        self.frames.first().map(|f| f.line_number).unwrap_or(0)
    }

    pub fn as_string(&self) -> String {
        self.frames
            .iter()
            .map(|info| match &info.function_name {
                Some(name) => format!("[line {}] in {}()", info.line_number, name),
                None => format!("[line {}] in script", info.line_number),
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}

impl std::fmt::Display for StackTrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_string())
    }
}
