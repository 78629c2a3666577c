error_chain! {
    types {
        BencodeParseError, BencodeParseErrorKind, BencodeParseResultExt, BencodeParseResult;
    }

    errors {
        BytesEmpty {
            pos: usize
        } {
            description("Incomplete Number Of Bytes")
            display("Incomplete Number Of Bytes At Position {}", pos)
        }
        InvalidByte {
            pos: usize
        } {
            description("Invalid Byte Found")
            display("Invalid Byte Found At Position {}", pos)
        }
        InvalidInt {
            pos: usize
        } {
            description("Invalid Integer Found")
            display("Invalid Integer Found At Position {}", pos)
        }
        InvalidKey {
            pos: usize
        } {
            description("Invalid Dictionary Key Found")
            display("Invalid Dictionary Key Found At Position {}", pos)
        }
        InvalidLength {
            pos: usize
        } {
            description("Invalid Byte Length Found")
            display("Invalid Byte Length Found At Position {}", pos)
        }
        InvalidRecursion {
            pos: usize
        } {
            description("Invalid Recursion Depth Reached")
            display("Invalid Recursion Depth Reached At Position {}", pos)
        }
    }
}
