//! Files written into every new function root.

/// Initial contents of `.funcignore`.
pub const FUNCIGNORE: &str = "
# Use the .funcignore file to exclude files which should not be
# tracked in the image build. To instruct the system not to track
# files in the image build, add the regex pattern or file information
# to this file.
";
